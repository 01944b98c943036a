//! Regression tests for statement classification

use super::*;
use crate::core::spectre2spice::source::{join_statements, split_lines, Item};

fn statement(text: &str) -> LogicalStatement {
    join_statements(split_lines(text))
        .into_iter()
        .find_map(|item| match item {
            Item::Statement(stmt) => Some(stmt),
            Item::Line(_) => None,
        })
        .expect("no statement in input")
}

fn classify_in(symbols: &str, text: &str, dialect: Dialect) -> StatementKind {
    let symbols = SymbolTable::scan(symbols);
    let options = S2SOptions::default();
    Classifier::new(&symbols, &options).classify(&statement(text), dialect)
}

fn classify(text: &str) -> StatementKind {
    classify_in("", text, Dialect::Spectre)
}

#[test]
fn test_simulator_lang() {
    assert_eq!(classify("simulator lang=spice"), StatementKind::Simulator(Some(Dialect::Spice)));
    assert_eq!(
        classify_in("", "simulator lang = spectre", Dialect::Spice),
        StatementKind::Simulator(Some(Dialect::Spectre))
    );
    assert_eq!(classify("simulator insensitive=yes"), StatementKind::Simulator(None));
}

#[test]
fn test_parameters_markers() {
    assert_eq!(classify("parameters a=1"), StatementKind::Parameters);
    assert_eq!(classify("params: a=1"), StatementKind::Parameters);
    assert_eq!(classify(".PARAM a=1"), StatementKind::Parameters);
    // Spectre keywords mean nothing in SPICE mode
    assert_eq!(classify_in("", "parameters a=1", Dialect::Spice), StatementKind::Other);
    assert_eq!(classify_in("", ".param a=1", Dialect::Spice), StatementKind::Parameters);
}

#[test]
fn test_model_heads() {
    match classify("model nch bsim4 {") {
        StatementKind::ModelOpen(head) => {
            assert_eq!(head.name, "nch");
            assert_eq!(head.keyword, "bsim4");
            assert!(head.braced);
            assert!(head.rest.is_empty());
        }
        other => panic!("expected model, got {:?}", other),
    }

    match classify_in("", ".model d1 d(is=1e-14", Dialect::Spice) {
        StatementKind::ModelOpen(head) => {
            assert_eq!(head.keyword, "d");
            assert_eq!(head.rest, "is=1e-14");
            assert!(head.parenthesized);
            assert!(!head.braced);
        }
        other => panic!("expected model, got {:?}", other),
    }
}

#[test]
fn test_bins_and_block_close() {
    assert_eq!(
        classify("0: type=n"),
        StatementKind::BinHeader {
            index: 0,
            rest: "type=n".to_string()
        }
    );
    assert_eq!(classify("}"), StatementKind::BlockClose);
}

#[test]
fn test_subcircuit_forms() {
    match classify("inline subckt nfet (d g s b)") {
        StatementKind::SubcircuitOpen(head) => {
            assert_eq!(head.name, "nfet");
            assert_eq!(head.form, SubcircuitForm::SpectreParen);
            assert_eq!(head.rest, "(d g s b)");
        }
        other => panic!("expected subckt, got {:?}", other),
    }
    match classify("subckt plain a b") {
        StatementKind::SubcircuitOpen(head) => assert_eq!(head.form, SubcircuitForm::SpectreBare),
        other => panic!("expected subckt, got {:?}", other),
    }
    match classify_in("", ".SUBCKT INV A Y", Dialect::Spice) {
        StatementKind::SubcircuitOpen(head) => {
            assert_eq!(head.name, "INV");
            assert_eq!(head.form, SubcircuitForm::Spice);
        }
        other => panic!("expected subckt, got {:?}", other),
    }
}

#[test]
fn test_subcircuit_close() {
    assert_eq!(
        classify("ends inv"),
        StatementKind::SubcircuitClose {
            name: Some("inv".to_string())
        }
    );
    assert_eq!(classify(".ends"), StatementKind::SubcircuitClose { name: None });
    assert_eq!(classify_in("", "ends inv", Dialect::Spice), StatementKind::Other);
}

#[test]
fn test_directives() {
    assert_eq!(
        classify("include \"models.scs\""),
        StatementKind::Directive(".include \"models.scs\"".to_string())
    );
    assert_eq!(
        classify("include \"models.scs\" section=tt"),
        StatementKind::Directive(".lib \"models.scs\" tt".to_string())
    );
    assert_eq!(classify("section ff"), StatementKind::Directive(".lib ff".to_string()));
    assert_eq!(classify("endsection ff"), StatementKind::Directive(".endl ff".to_string()));
    assert_eq!(classify("global 0 vdd!"), StatementKind::Directive(".global vdd!".to_string()));
    assert_eq!(
        classify("ahdl_include \"res.va\""),
        StatementKind::Directive("* ahdl_include \"res.va\"".to_string())
    );
}

#[test]
fn test_paren_call() {
    match classify("rload (n1 n2) resistor r=1k") {
        StatementKind::DeviceCall(call) => {
            assert_eq!(call.instance, "rload");
            assert_eq!(call.pins, vec!["n1", "n2"]);
            assert_eq!(call.reference, "resistor");
            assert_eq!(call.params, "r=1k");
            assert_eq!(call.consumed, 1);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_paren_call_across_lines() {
    match classify("m1 (d g\n+ s b) nch w=1u\n+ l=1u") {
        StatementKind::DeviceCall(call) => {
            assert_eq!(call.pins, vec!["d", "g", "s", "b"]);
            assert_eq!(call.reference, "nch");
            assert_eq!(call.params, "w=1u");
            assert_eq!(call.consumed, 2);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_bare_call_needs_known_reference() {
    let symbols = "subckt later_sub (a b)\n";
    match classify_in(symbols, "xi1 a b later_sub", Dialect::Spectre) {
        StatementKind::DeviceCall(call) => {
            assert_eq!(call.instance, "xi1");
            assert_eq!(call.reference, "later_sub");
        }
        other => panic!("expected call, got {:?}", other),
    }
    assert_eq!(classify("tran1 tran stop=1u"), StatementKind::Other);
}

#[test]
fn test_cdl_slash_removed() {
    let symbols = ".subckt inv a y\n";
    match classify_in(symbols, "X1 in out / inv", Dialect::Spice) {
        StatementKind::DeviceCall(call) => {
            assert_eq!(call.pins, vec!["in", "out"]);
            assert_eq!(call.reference, "inv");
        }
        other => panic!("expected call, got {:?}", other),
    }
    match classify_in(symbols, "X2 in out /inv", Dialect::Spice) {
        StatementKind::DeviceCall(call) => assert_eq!(call.reference, "inv"),
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_priority_parameters_before_call() {
    // `parameters` would otherwise look like a call to nothing
    assert_eq!(classify_in("model x bsim4 {", "parameters x", Dialect::Spectre), StatementKind::Parameters);
}
