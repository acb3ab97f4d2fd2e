//! Pruebas de integración de la pipeline completa.

use microc::{lex::LexerError, translate};

const SCENARIO: &str = "int a = 3; int b = 4; int i; \
                        for (i = 0; i <= 3; i++) { \
                        if (a == b) { a += i + 2; } \
                        if (a != b) { a = a + 1; } }";

#[test]
fn translates_the_reference_scenario() {
    let translation = translate(SCENARIO).unwrap();

    assert!(translation.warnings.is_empty());
    assert_eq!(
        translation.assembly,
        "li $t0, 3\n\
         li $t2, 4\n\
         li $t1, 0\n\
         LOOP_START:\n\
         bgt $t1, 3, LOOP_END\n\
         beq $t0, $t2, IF_TRUE0\n\
         j IF_FALSE0\n\
         IF_TRUE0:\n\
         add $t0, $t0, $t1\n\
         addi $t0, $t0, 2\n\
         j END_IF0\n\
         IF_FALSE0:\n\
         END_IF0:\n\
         bne $t0, $t2, IF_TRUE1\n\
         j IF_FALSE1\n\
         IF_TRUE1:\n\
         add $t0, $t0, 1\n\
         j END_IF1\n\
         IF_FALSE1:\n\
         END_IF1:\n\
         addi $t1, $t1, 1\n\
         j LOOP_START\n\
         LOOP_END:\n"
    );
}

#[test]
fn empty_input_translates_to_empty_assembly() {
    let translation = translate("").unwrap();

    assert!(translation.assembly.is_empty());
    assert!(translation.warnings.is_empty());
}

#[test]
fn independent_runs_are_identical() {
    let first = translate(SCENARIO).unwrap();
    let second = translate(SCENARIO).unwrap();

    assert_eq!(first.assembly, second.assembly);
}

#[test]
fn lexical_diagnostics_are_not_fatal() {
    let translation = translate("int a = 3; $").unwrap();

    assert_eq!(translation.warnings.len(), 1);
    assert!(matches!(
        translation.warnings[0].as_ref(),
        LexerError::BadChar('$')
    ));
    assert_eq!(translation.assembly, "li $t0, 3\n");
}
