//! End-to-end tests of host callables driving macro expansion

use ppbridge_core::token::spell;
use ppbridge_core::{Error, Result, Token};
use ppbridge_host::{host_fn, HostError, HostValue, Session};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn shape(tokens: &[Token]) -> Vec<(String, String)> {
    tokens
        .iter()
        .map(|t| (t.kind.to_string(), t.spelling.clone()))
        .collect()
}

/// Collect output up to the first error
fn run_partial(session: &Session, text: &str) -> (Vec<Token>, Option<Error>) {
    let mut out = Vec::new();
    for item in session.preprocess(text).unwrap() {
        match item {
            Ok(token) => out.push(token),
            Err(e) => return (out, Some(e)),
        }
    }
    (out, None)
}

#[test]
fn test_empty_result_expands_to_nothing() {
    let mut session = Session::new("empty");
    assert!(session.define_function_macro("NOTHING", host_fn(|_, _| Ok(HostValue::None))));

    assert_eq!(session.preprocess_to_string("NOTHING()").unwrap(), "");
    assert_eq!(
        session.preprocess_to_string("a NOTHING(1, (2, 3), x y) b").unwrap(),
        "a b"
    );
}

#[test]
fn test_text_result_matches_direct_tokenize() {
    let mut session = Session::new("text");
    assert!(session.define_function_macro("TWO", host_fn(|_, _| Ok("1+1".into()))));

    let expanded = session
        .preprocess("TWO()")
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    let direct = session.tokenize("1+1").unwrap();
    assert_eq!(shape(&expanded), shape(&direct));
}

#[test]
fn test_text_result_is_rescanned_with_current_macros() {
    let mut session = Session::new("rescan");
    assert!(session.define_function_macro("GET", host_fn(|_, _| Ok("N".into()))));
    assert!(session.define_plain_macro("N=10", false));
    assert_eq!(session.preprocess_to_string("GET()").unwrap(), "10");

    assert!(session.undefine("N"));
    assert!(session.define_plain_macro("N=20", false));
    assert_eq!(session.preprocess_to_string("GET()").unwrap(), "20");
}

#[test]
fn test_arguments_arrive_as_token_sequences() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = seen.clone();

    let mut session = Session::new("args");
    assert!(session.define_function_macro(
        "SWAP",
        host_fn(move |_, args| {
            let spelled: Vec<Vec<String>> = args
                .iter()
                .map(|arg| arg.tokens().iter().map(|t| t.spelling().to_string()).collect())
                .collect();
            record.borrow_mut().push(spelled);
            Ok(args.iter().rev().flat_map(|a| a.as_seq().unwrap_or_default().to_vec()).collect())
        })
    ));

    assert_eq!(session.preprocess_to_string("SWAP(a + b, c)").unwrap(), "c a + b");
    assert_eq!(
        seen.borrow()[0],
        vec![
            vec!["a".to_string(), "+".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ]
    );
}

#[test]
fn test_non_token_element_substitutes_nothing() {
    let mut session = Session::new("invalid");
    assert!(session.define_function_macro(
        "BAD",
        host_fn(|cx, _| {
            let mut items = cx.session().tokenize("x y")?;
            items.push(HostValue::from("not a token"));
            Ok(items.into())
        })
    ));

    let (out, err) = run_partial(&session, "a BAD() b");
    assert_eq!(spell(&out), "a");
    let err = err.expect("expansion should fail");
    assert!(matches!(err.root(), Error::InvalidMacroResult(_)));
}

#[test]
fn test_non_sequence_result_is_invalid() {
    let mut session = Session::new("int");
    assert!(session.define_function_macro("INT", host_fn(|_, _| Ok(HostValue::Int(1)))));

    let err = session.preprocess_to_string("INT()").unwrap_err();
    assert!(matches!(err.root(), Error::InvalidMacroResult(_)));
}

#[test]
fn test_tokens_from_another_session_are_rejected() {
    let a = Session::new("a");
    let foreign = a.handle().tokenize("x").unwrap();

    let mut b = Session::new("b");
    assert!(b.define_function_macro(
        "FOREIGN",
        host_fn(move |_, _| Ok(foreign.clone().into()))
    ));

    let err = b.preprocess_to_string("FOREIGN()").unwrap_err();
    match err.root() {
        Error::CrossSessionToken { spelling, origin, session } => {
            assert_eq!(spelling, "x");
            assert_eq!(*origin, a.id().as_u64());
            assert_eq!(*session, b.id().as_u64());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_tokens_from_the_same_session_are_accepted() {
    let mut session = Session::new("same");
    assert!(session.define_function_macro(
        "MAKE",
        host_fn(|cx, _| Ok(cx.session().tokenize("int x ;")?.into()))
    ));
    assert_eq!(session.preprocess_to_string("MAKE()").unwrap(), "int x ;");
}

#[test]
fn test_function_macro_cannot_replace_predefined() {
    let mut session = Session::new("predefined");
    assert!(session.define_plain_macro("VERSION=3", true));

    assert!(!session.define_function_macro("VERSION", host_fn(|_, _| Ok(HostValue::None))));
    assert_eq!(session.preprocess_to_string("VERSION").unwrap(), "3");
    assert_eq!(session.external_refs(), 0);
}

#[test]
fn test_function_macro_names_are_bound_once() {
    let mut session = Session::new("twice");
    assert!(session.define_function_macro("F", host_fn(|_, _| Ok("1".into()))));
    assert!(!session.define_function_macro("F", host_fn(|_, _| Ok("2".into()))));
    assert!(!session.undefine("F"));
    assert_eq!(session.preprocess_to_string("F()").unwrap(), "1");
}

#[test]
fn test_external_refs_return_to_baseline() {
    let mut session = Session::new("refs");
    assert!(session.define_function_macro(
        "ECHO",
        host_fn(|_, args| Ok(args.first().cloned().unwrap_or(HostValue::None)))
    ));
    assert!(session.define_function_macro(
        "FAIL",
        host_fn(|cx, args| {
            let _held = (cx.session_value(), args.to_vec());
            Err(HostError::new("refused"))
        })
    ));
    assert!(session.define_function_macro(
        "WRONG",
        host_fn(|_, args| {
            let mut items = args[0].as_seq().unwrap_or_default().to_vec();
            items.push(HostValue::Int(0));
            Ok(items.into())
        })
    ));

    let baseline = session.external_refs();
    assert_eq!(baseline, 3);

    for _ in 0..5 {
        assert_eq!(session.preprocess_to_string("ECHO(a b c)").unwrap(), "a b c");
        assert!(session.preprocess_to_string("FAIL(a, b)").is_err());
        assert!(session.preprocess_to_string("WRONG(a)").is_err());
        assert_eq!(session.external_refs(), baseline);
    }
}

#[test]
fn test_callback_failure_reports_site() {
    let mut session = Session::new("site");
    assert!(session.define_function_macro(
        "FAIL",
        host_fn(|_, _| Err(HostError::new("bad input")))
    ));

    let err = session.preprocess_to_string("x\n  FAIL()").unwrap_err();
    match &err {
        Error::Expansion { name, location, source } => {
            assert_eq!(name, "FAIL");
            assert_eq!(location, "<input>:2:3");
            match &**source {
                Error::CallbackFailed { message, .. } => assert_eq!(message, "bad input"),
                other => panic!("unexpected error: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_context_location_and_session() {
    let mut session = Session::new("context");
    let id = session.id();
    assert!(session.define_function_macro(
        "WHERE",
        host_fn(move |cx, _| {
            let location = cx.location_value();
            let location = location.as_location().ok_or_else(|| HostError::new("no location"))?;
            let handle = cx.session_value();
            if handle.as_session().map(|h| h.id()) != Some(id) {
                return Err(HostError::new("wrong session"));
            }
            Ok(format!("{} {}", location.line(), location.column()).into())
        })
    ));

    assert_eq!(session.preprocess_to_string("\n\n   WHERE()").unwrap(), "3 4");
}

#[test]
fn test_token_locations_and_closed_buffers() {
    let session = Session::new("locations");
    let handle = session.handle();
    let tokens = handle.tokenize_named("buf.c", "a\nbb").unwrap();

    let second = tokens[1].as_token().unwrap();
    let location = second.location().unwrap();
    assert_eq!((location.file(), location.line(), location.column()), ("buf.c", 2, 1));

    assert!(session.close_buffer_at(second.position()));
    assert!(matches!(second.location(), Err(Error::Resolution { .. })));
    assert!(matches!(session.resolve(second.position()), Err(Error::Resolution { .. })));
}

#[test]
fn test_handle_outlives_session() {
    let session = Session::new("outlived");
    let handle = session.handle();
    drop(session);

    assert_eq!(handle.name(), "outlived");
    assert_eq!(handle.external_refs(), 1);
    let tokens = handle.tokenize("still works").unwrap();
    assert_eq!(tokens.len(), 2);
}

#[test]
fn test_nested_callbacks() {
    let mut session = Session::new("nested");
    assert!(session.define_function_macro(
        "INNER",
        host_fn(|_, args| Ok(format!("({})", args.len()).into()))
    ));
    assert!(session.define_function_macro(
        "OUTER",
        host_fn(|_, _| Ok("INNER(a, b) INNER()".into()))
    ));

    assert_eq!(session.preprocess_to_string("OUTER()").unwrap(), "( 2 ) ( 0 )");
}

#[test]
fn test_run_is_lazy_and_single_pass() {
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();

    let mut session = Session::new("lazy");
    assert!(session.define_function_macro(
        "TICK",
        host_fn(move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(HostValue::None)
        })
    ));

    let input = session.tokenize("a TICK() b TICK()").unwrap();
    let mut run = session.run(input);
    assert_eq!(*calls.borrow(), 0);

    assert_eq!(run.next().unwrap().unwrap().spelling, "a");
    assert_eq!(run.next().unwrap().unwrap().spelling, "b");
    assert_eq!(*calls.borrow(), 1);
    assert!(run.next().is_none());
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn test_location_is_outermost_expansion_site() {
    let mut session = Session::new("site");
    assert!(session.define_function_macro(
        "HERE",
        host_fn(|cx, _| Ok(format!("\"{}\"", cx.location()).into()))
    ));
    assert!(session.define_function_macro("INDIRECT", host_fn(|_, _| Ok("HERE()".into()))));
    assert!(session.define_plain_macro("WRAP=HERE()", false));

    assert_eq!(session.preprocess_to_string("\n\n  WRAP").unwrap(), "\"<input>:3:3\"");
    assert_eq!(session.preprocess_to_string(" INDIRECT()").unwrap(), "\"<input>:1:2\"");
    assert_eq!(session.preprocess_to_string("HERE()").unwrap(), "\"<input>:1:1\"");
}
