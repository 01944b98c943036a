//! Integration tests for spicebridge netlist conversion

use std::fs;

use spicebridge::{
    convert_path, spectre_to_spice, spectre_to_spice_with_options, Dialect, FileStatus, S2SOptions,
    Transpiler, WarningKind,
};

/// A small Spectre library touching most statement kinds
const MIXED: &str = r#"// top-level parameters
simulator lang=spectre
parameters vdd=1.8 wn=2*wmin ln=lmin
include "models.scs" section=tt

inline subckt nfet (d g s b)
parameters w=1u l=100n
  main (d g s b) nch w=w l=l
model nch bsim4 {
0: type=n lmin=0 lmax=1u
+ vth0=0.4
1: type=n lmin=1u lmax=10u
+ vth0=0.45
}
ends nfet

subckt inv (a y vdd vss)
xn (y a vss vss) nfet w=wn
rload (y vdd) resistor r=10k
ends inv
"#;

fn code_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('*') && !l.starts_with('+') && !l.starts_with('.'))
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_parameters() {
        assert_eq!(spectre_to_spice("parameters a=1 b=2*x\n"), ".param a=1 b={2*x}\n");
    }

    #[test]
    fn test_inline_subcircuit_resistor() {
        let output = spectre_to_spice("inline subckt wrap (n1 n2)\nrload (n1 n2) resistor r=1k\nends wrap\n");
        assert_eq!(output, ".subckt wrap n1 n2\nrload n1 n2 r=1k\n\n.ends wrap\n");
    }

    #[test]
    fn test_forward_referenced_subcircuit() {
        let input = "subckt top (a b)\ni1 (a b) leaf\nends top\nsubckt leaf (p q)\nends leaf\n";
        let output = spectre_to_spice(input);
        assert!(output.contains("\nxi1 a b leaf\n"), "got:\n{}", output);
    }

    #[test]
    fn test_binned_model_in_subcircuit() {
        let input = "\
subckt cell (d g s b)
m0 (d g s b) nch w=1u l=1u
model nch bsim4 {
0: type=n
+ lmin=1u lmax=2u
}
ends cell
";
        let expected = "\
.subckt cell d g s b
m0 d g s b nch w=1u l=1u

.model nch.0 nmos
+ lmin=1u lmax=2u
.ends cell
";
        let output = spectre_to_spice_with_options(input, S2SOptions::default());
        assert_eq!(output.content, expected);
        assert!(!output.has_warnings());
    }

    #[test]
    fn test_second_run_is_identical() {
        let once = spectre_to_spice(MIXED);
        let twice = spectre_to_spice(&once);
        assert_eq!(once, twice);
        assert_eq!(spectre_to_spice(&twice), twice);
    }

    #[test]
    fn test_mismatched_close_keeps_open_name() {
        let output = spectre_to_spice_with_options("subckt inv (a y)\nends buf\n", S2SOptions::default());
        assert_eq!(output.content, ".subckt inv a y\n\n.ends inv\n");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::MismatchedClose);
        assert_eq!(output.warnings[0].line, Some(2));
    }
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_library() {
        let output = spectre_to_spice(MIXED);
        for line in [
            "* top-level parameters",
            ".param vdd=1.8 wn={2*wmin} ln={lmin}",
            ".lib \"models.scs\" tt",
            ".subckt nfet d g s b",
            "+ w=1u l=100n",
            "main d g s b nch w={w} l={l}",
            ".model nch.0 nmos lmin=0 lmax=1u",
            ".model nch.1 nmos lmin=1u lmax=10u",
            "xn y a vss vss nfet w={wn}",
            "rload y vdd r=10k",
        ] {
            assert!(output.lines().any(|l| l == line), "missing '{}' in:\n{}", line, output);
        }
        assert!(!output.contains("simulator"));
    }

    #[test]
    fn test_instance_prefix_inside_subcircuit() {
        let input = "subckt cell (d g s b)\nn1 (d g s b) nch w=1u\nm2 (d g s b) nch\nends cell\nmodel nch nmos\n";
        let output = spectre_to_spice(input);
        assert!(output.contains("\nmn1 d g s b nch w=1u\n"), "got:\n{}", output);
        assert!(output.contains("\nm2 d g s b nch\n"), "got:\n{}", output);
    }

    #[test]
    fn test_comments_and_blanks_preserved() {
        let input = "// one\n\n* two\nparameters a=1\n\n// three\n";
        assert_eq!(spectre_to_spice(input), "* one\n\n* two\n.param a=1\n\n* three\n");
    }

    #[test]
    fn test_comment_inside_continuation() {
        let input = "parameters a=1\n// between\n+ b=x\n";
        assert_eq!(spectre_to_spice(input), ".param a=1\n* between\n+ b={x}\n");
    }

    #[test]
    fn test_subcircuit_round_trip() {
        let output = spectre_to_spice(MIXED);
        let opens: Vec<&str> = output.lines().filter(|l| l.starts_with(".subckt")).collect();
        let closes: Vec<&str> = output.lines().filter(|l| l.starts_with(".ends")).collect();
        assert_eq!(opens, vec![".subckt nfet d g s b", ".subckt inv a y vdd vss"]);
        assert_eq!(closes, vec![".ends nfet", ".ends inv"]);
    }

    #[test]
    fn test_prefix_totality() {
        let output = spectre_to_spice(MIXED);
        for line in code_lines(&output) {
            let first = line.chars().next().unwrap().to_ascii_lowercase();
            assert!("mrclqdx".contains(first), "unprefixed call '{}'", line);
        }
    }

    #[test]
    fn test_parameter_delimiting() {
        assert_eq!(
            spectre_to_spice("parameters a=1 b=x c=1.5e-3 d=2u e=x+1\n"),
            ".param a=1 b={x} c=1.5e-3 d=2u e={x+1}\n"
        );
    }

    #[test]
    fn test_bins_are_unique() {
        let input = "\
model nch bsim4 {
0: type=n
+ vth0=0.4
0: type=n
+ vth0=0.5
1: type=n
}
";
        let output = spectre_to_spice(input);
        let heads: Vec<&str> = output.lines().filter(|l| l.starts_with(".model")).collect();
        assert_eq!(heads, vec![".model nch.0 nmos", ".model nch.1 nmos"]);
        assert!(output.contains("+ vth0=0.5"));
        assert!(!output.contains("+ vth0=0.4"));
    }
}

// ============================================================================
// Delimiting
// ============================================================================

mod delimiting {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_balanced(output: &str) {
        assert_eq!(
            output.matches('{').count(),
            output.matches('}').count(),
            "unbalanced braces in:\n{}",
            output
        );
    }

    #[test]
    fn test_header_expression_across_lines() {
        let output = spectre_to_spice("subckt inv (a y) w=2*l\n+ l=lmin*2 +\n+ 1\nends inv\n");
        assert_eq!(output, ".subckt inv a y\n+ w={2*l}\n+ l={lmin*2+\n+ 1}\n\n.ends inv\n");
        assert_balanced(&output);
        assert!(!output.contains('$'));
    }

    #[test]
    fn test_value_closed_at_statement_end() {
        let inputs = [
            "parameters a=2*x +\nparameters b=1\n",
            "subckt s (a b)\nr1 (a b) resistor r=2*x +\nends s\n",
            ".param a={2*x+\n",
            "model dn diode is=1e-14 n=a*\n",
        ];
        for input in inputs {
            let output = spectre_to_spice_with_options(input, S2SOptions::default());
            assert_balanced(&output.content);
            assert!(!output.content.contains('$'), "comment in:\n{}", output.content);
            assert!(
                output.warnings.iter().any(|w| w.kind == WarningKind::Malformed),
                "no warning for {:?}",
                input
            );
        }
        assert_eq!(
            spectre_to_spice("parameters a=2*x +\nparameters b=1\n"),
            ".param a={2*x+}\n.param b=1\n"
        );
    }

    #[test]
    fn test_empty_value_keeps_next_assignment() {
        assert_eq!(spectre_to_spice("parameters a= b=1\n"), ".param b=1 $ a=\n");
        let output = spectre_to_spice("parameters a=\n");
        assert_eq!(output, ".param $ a=\n");
        assert_balanced(&output);
    }

    #[test]
    fn test_spice_header_parameters() {
        let expected = ".subckt inv a y\n+ w={2*l}\n\n.ends inv\n";
        let input = ".subckt inv a y w=2*l\n.ends inv\n";
        let output = Transpiler::default().convert_with_dialect(input, Dialect::Spice);
        assert_eq!(output.content, expected);
        assert_eq!(spectre_to_spice(input), expected);
        assert_eq!(spectre_to_spice(expected), expected);
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

mod diagnostics {
    use super::*;
    use pretty_assertions::assert_eq;

    fn warnings(input: &str) -> Vec<WarningKind> {
        spectre_to_spice_with_options(input, S2SOptions::default())
            .warnings
            .iter()
            .map(|w| w.kind)
            .collect()
    }

    #[test]
    fn test_unresolved_device_becomes_subcircuit_call() {
        let output = spectre_to_spice_with_options("i1 (a b) ghost\n", S2SOptions::default());
        assert_eq!(output.content, "xi1 a b ghost\n");
        assert_eq!(output.warnings[0].kind, WarningKind::UnresolvedDevice);
        assert_eq!(output.warnings[0].line, Some(1));
    }

    #[test]
    fn test_unresolved_polarity() {
        let output = spectre_to_spice_with_options("model q1 vbic\n", S2SOptions::default());
        assert_eq!(output.content, ".model q1 vbic\n");
        assert_eq!(output.warnings[0].kind, WarningKind::UnresolvedPolarity);
    }

    #[test]
    fn test_unmatched_close() {
        assert_eq!(warnings("ends nothing\n"), vec![WarningKind::UnmatchedClose]);
    }

    #[test]
    fn test_nested_subcircuit() {
        let kinds = warnings("subckt outer (a)\nsubckt inner (b)\nends outer\n");
        assert_eq!(kinds, vec![WarningKind::NestedSubcircuit]);
    }

    #[test]
    fn test_unterminated_subcircuit() {
        let output = spectre_to_spice_with_options("subckt open (a b)\n", S2SOptions::default());
        assert_eq!(output.content, ".subckt open a b\n\n.ends open\n");
        assert_eq!(output.warnings[0].kind, WarningKind::UnterminatedBlock);
    }

    #[test]
    fn test_clean_input_has_no_warnings() {
        assert!(warnings(MIXED).is_empty());
    }
}

// ============================================================================
// Dialects and options
// ============================================================================

mod dialects {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cdl_subcircuit_call() {
        let input = "\
.SUBCKT INV A Y VDD VSS
MN0 Y A VSS VSS nch W=1u L=100n
.ENDS INV
.SUBCKT TOP IN OUT VDD VSS
XI0 IN OUT VDD VSS / INV
.ENDS TOP
.model nch nmos
";
        let output = Transpiler::default().convert_with_dialect(input, Dialect::Spice);
        let text = output.content;
        assert!(text.contains("\nMN0 Y A VSS VSS nch W=1u L=100n\n"), "got:\n{}", text);
        assert!(text.contains("\nXI0 IN OUT VDD VSS INV\n"), "got:\n{}", text);
        assert!(text.contains("\n.ends INV\n"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_mixed_dialect_switch() {
        let input = "\
simulator lang=spice
.param k=2
R1 a b 1k
simulator lang=spectre
r2 (a b) resistor r=k
";
        assert_eq!(spectre_to_spice(input), ".param k=2\nR1 a b 1k\nr2 a b r={k}\n");
    }

    #[test]
    fn test_statistics_block_commented() {
        let input = "statistics {\n  process {\n    vary tox dist=gauss std=0.1\n  }\n}\n";
        assert_eq!(
            spectre_to_spice(input),
            "* statistics {\n* process {\n* vary tox dist=gauss std=0.1\n* }\n* }\n"
        );
    }

    #[test]
    fn test_yes_no_switch() {
        assert_eq!(
            spectre_to_spice("parameters sw_stat_global=yes sw_stat_mismatch=no\n"),
            ".param sw_stat_global=1 sw_stat_mismatch=0\n"
        );
    }

    #[test]
    fn test_sqrt_multiplicity() {
        let input = "subckt cell (a b)\nr1 (a b) resistor r={1k/sqrt(m)}\nends cell\n";
        assert_eq!(
            spectre_to_spice(input),
            ".subckt cell a b\n+ mult=1\nr1 a b r={1k/sqrt(mult)}\n\n.ends cell\n"
        );
    }

    #[test]
    fn test_toml_raw_keywords() {
        let options = S2SOptions::from_toml_str(
            r#"
normalize = false

[raw_keywords.vsrc]
prefix = "v"
primitive = true
"#,
        )
        .unwrap();
        let output = Transpiler::new(options).convert("vdd_src (vdd 0) vsrc dc=1.8\n");
        assert_eq!(output.content, "vdd_src vdd 0 dc=1.8\n");
        assert!(output.warnings.is_empty());
    }
}

// ============================================================================
// Files
// ============================================================================

mod files {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_file_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("inv.scs");
        let output = dir.path().join("inv.sp");
        fs::write(&input, "subckt inv (a y)\nends inv\n").unwrap();

        let report = convert_path(&Transpiler::default(), &input, Some(&output)).unwrap();
        assert_eq!(report.count(FileStatus::Converted), 1);
        assert_eq!(fs::read_to_string(&output).unwrap(), ".subckt inv a y\n\n.ends inv\n");
        // input untouched
        assert_eq!(fs::read_to_string(&input).unwrap(), "subckt inv (a y)\nends inv\n");
    }

    #[test]
    fn test_batch_with_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lib");
        let output = dir.path().join("out");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("a.scs"), "parameters a=x\n").unwrap();
        fs::write(input.join("b.cdl"), "parameters a=x\n").unwrap();
        fs::write(input.join("c.scs"), "i1 (a b) ghost\n").unwrap();
        fs::write(input.join("d.vams"), "module d;\nendmodule\n").unwrap();

        let report = convert_path(&Transpiler::default(), &input, Some(&output)).unwrap();
        assert_eq!(report.count(FileStatus::Converted), 3);
        assert_eq!(report.count(FileStatus::Skipped), 1);
        assert!(!report.has_failures());
        assert_eq!(report.warning_count(), 1);

        assert_eq!(fs::read_to_string(output.join("a.scs")).unwrap(), ".param a={x}\n");
        // CDL files start in the SPICE dialect
        assert_eq!(fs::read_to_string(output.join("b.cdl")).unwrap(), "parameters a=x\n");

        let json_path = dir.path().join("report.json");
        report.write_json(&json_path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["files"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        fs::create_dir(&input).unwrap();
        let report = convert_path(&Transpiler::default(), &input, None).unwrap();
        assert!(report.files.is_empty());
        assert!(dir.path().join("empty_spice").is_dir());
    }
}
