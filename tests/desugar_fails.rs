use cwhile::{
    desugar_source,
    run,
    CwhileError,
};
use cwhile_desugar::{
    DesugarError,
    LoopDefect,
    MalformedLoopExtension,
    OutOfScopeLoopVariable,
};
use cwhile_parser::{
    identifiers::Ident,
    ASTAllocator,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

fn malformed(defect: LoopDefect) -> CwhileError {
    CwhileError::Desugar(DesugarError::Malformed(MalformedLoopExtension { defect }))
}

#[test]
fn host_without_iterate() {
    let src = indoc! {"
        for (let i = 0; i < 3;) {
            continue while (true) {}
        }
    "};
    assert_eq!(run(src), Err(malformed(LoopDefect::MissingIterate)));
}

#[test]
fn host_without_condition() {
    let src = indoc! {"
        for (let i = 0; ; i += 1) {
            if (i > 3) { break; }
            continue while (true) {}
        }
    "};
    assert_eq!(run(src), Err(malformed(LoopDefect::MissingCondition)));
}

#[test]
fn while_without_for_host() {
    let src = indoc! {"
        let i = 0;
        while (i < 3) {
            continue while (true) { i += 1; }
        }
    "};
    assert_eq!(run(src), Err(malformed(LoopDefect::NoEnclosingLoop)));
}

#[test]
fn while_inside_host_without_iterate() {
    let src = indoc! {"
        for (let i = 0; i < 3;) {
            while (true) {
                continue while (true) {}
            }
        }
    "};
    assert_eq!(run(src), Err(malformed(LoopDefect::MissingIterate)));
}

#[test]
fn outside_any_loop() {
    let result = run("continue while (true) {}");
    assert_eq!(result, Err(malformed(LoopDefect::NoEnclosingLoop)));
}

#[test]
fn element_read_in_else() {
    let src = indoc! {"
        for (x : [1, 2, 3]) {
            continue while (x < 2) {} else { total += x; }
        }
    "};
    let alloc = ASTAllocator::default();
    let result = desugar_source(src, &alloc);

    assert!(matches!(
        result,
        Err(CwhileError::Desugar(DesugarError::OutOfScope(
            OutOfScopeLoopVariable::ElementBinding(name)
        ))) if name == Ident::from("x")
    ));
}

#[test]
fn element_assignment() {
    let src = "for (x : [1]) { x = 2; }";
    let alloc = ASTAllocator::default();
    let result = desugar_source(src, &alloc);

    assert!(matches!(
        result,
        Err(CwhileError::Desugar(DesugarError::OutOfScope(
            OutOfScopeLoopVariable::AssignedElementBinding(_)
        )))
    ));
}

#[test]
fn index_outside_for() {
    let src = indoc! {"
        let i = 0;
        while (i < 3) { i += for.index; }
    "};
    assert_eq!(
        run(src),
        Err(CwhileError::Desugar(DesugarError::OutOfScope(
            OutOfScopeLoopVariable::LoopIndex
        )))
    );
}

#[test]
fn syntax_error_is_reported() {
    let result = run("for (x : xs { }");
    assert!(matches!(result, Err(CwhileError::SyntaxError(_))));
}
