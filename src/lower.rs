//! Traducción del árbol sintáctico a instrucciones objetivo.
//!
//! Esta fase recorre el árbol una única vez y acumula la secuencia
//! de instrucciones de [`crate::ir`] en una sesión de traducción.
//! Las variables se asignan a registros físicos mediante una tabla
//! cerrada y pre-cargada: no existe asignación general de registros,
//! y consultar un nombre fuera de la tabla es un error explícito.
//!
//! Cada sesión es dueña exclusiva de su buffer de instrucciones y de
//! su contador de etiquetas de `if`, por lo cual dos corridas nunca
//! observan numeración de la otra.

use std::collections::HashMap;
use thiserror::Error;

use crate::{
    ir::{Instruction, Label, Operand, Reg},
    parse::{
        AssignOp, Ast, BodyStatement, Declaration, Expression, ForLoop, IfStatement, Increment,
        Rhs, Sign, Statement,
    },
    source::{Located, Position},
};

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LowerError {
    #[error("Unsupported condition operator `{0}`")]
    UnsupportedConditionOperator(String),

    #[error("Unsupported expression `{0}`")]
    UnsupportedExpression(String),

    #[error("No register is mapped to variable `{0}`")]
    UnmappedVariable(String),
}

pub type Lower<T> = Result<T, Located<LowerError>>;

/// Tabla cerrada de variable a registro físico.
///
/// La tabla se pre-carga por completo antes de la traducción y es de
/// solo lectura durante la misma.
pub struct RegisterMap(HashMap<&'static str, Reg>);

impl RegisterMap {
    fn lookup(&self, name: &str, position: Position) -> Lower<Reg> {
        self.0.get(name).copied().ok_or_else(|| {
            Located::at(LowerError::UnmappedVariable(name.to_owned()), position)
        })
    }
}

impl Default for RegisterMap {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("a", Reg("$t0"));
        map.insert("i", Reg("$t1"));
        map.insert("b", Reg("$t2"));

        RegisterMap(map)
    }
}

/// Traduce un programa completo a su listado de instrucciones.
pub fn lower(ast: &Ast, registers: &RegisterMap) -> Lower<Vec<Instruction>> {
    let mut session = Session {
        registers,
        code: Vec::new(),
        if_count: 0,
    };

    for statement in &ast.statements {
        match statement {
            Statement::Declaration(declaration) => session.declaration(declaration)?,
            Statement::For(for_loop) => session.for_loop(for_loop)?,
        }
    }

    Ok(session.code)
}

/// Estado de una sesión de traducción.
struct Session<'a> {
    registers: &'a RegisterMap,
    code: Vec<Instruction>,
    if_count: u32,
}

impl Session<'_> {
    fn reg(&self, name: &Located<String>) -> Lower<Reg> {
        self.registers.lookup(name.as_ref(), name.position())
    }

    fn declaration(&mut self, declaration: &Declaration) -> Lower<()> {
        let reg = self.reg(&declaration.name)?;
        self.code
            .push(Instruction::LoadImm(reg, declaration.value.clone()));

        Ok(())
    }

    fn for_loop(&mut self, for_loop: &ForLoop) -> Lower<()> {
        let loop_reg = self.reg(&for_loop.init.variable)?;

        // Reinicialización idempotente: la carga inicial se omite si
        // una línea idéntica ya fue emitida antes en esta corrida
        let init = Instruction::LoadImm(loop_reg, for_loop.init.value.clone());
        if !self.already_emitted(&init) {
            self.code.push(init);
        }

        // Las etiquetas del lazo no se numeran: un único `for` por
        // traducción está soportado
        self.code.push(Instruction::Mark(Label::LoopStart));

        // El operador de comparación del código fuente se descarta;
        // la prueba de salida siempre es "mayor que"
        let condition_reg = self.reg(&for_loop.condition.variable)?;
        self.code.push(Instruction::BranchGt(
            condition_reg,
            for_loop.condition.value.clone(),
            Label::LoopEnd,
        ));

        for statement in &for_loop.body {
            match statement {
                BodyStatement::If(if_statement) => self.if_statement(if_statement)?,
                BodyStatement::Expression(expression) => self.expression(expression)?,
            }
        }

        // El incremento ocurre tras el cuerpo completo, sin importar
        // el control de flujo interno, sobre el registro de la
        // inicialización
        self.increment(&for_loop.step, loop_reg);

        self.code.push(Instruction::Jump(Label::LoopStart));
        self.code.push(Instruction::Mark(Label::LoopEnd));
        Ok(())
    }

    fn if_statement(&mut self, if_statement: &IfStatement) -> Lower<()> {
        let condition = &if_statement.condition;
        let reg = self.reg(&condition.variable)?;

        // El operando derecho de la comparación siempre se asume `b`
        let compare = self
            .registers
            .lookup("b", condition.operator.position())?;

        let number = self.if_count;
        self.if_count += 1;

        let true_label = Label::IfTrue(number);
        let false_label = Label::IfFalse(number);
        let end_label = Label::IfEnd(number);

        let branch = match condition.operator.as_ref().as_str() {
            "==" => Instruction::BranchEq(reg, compare, true_label),
            "!=" => Instruction::BranchNe(reg, compare, true_label),
            other => {
                return Err(Located::at(
                    LowerError::UnsupportedConditionOperator(other.to_owned()),
                    condition.operator.position(),
                ))
            }
        };

        self.code.push(branch);
        self.code.push(Instruction::Jump(false_label));
        self.code.push(Instruction::Mark(true_label));

        // Solo el primer statement del cuerpo se traduce
        if let Some(first) = if_statement.body.first() {
            self.expression(first)?;
        }

        self.code.push(Instruction::Jump(end_label));
        self.code.push(Instruction::Mark(false_label));
        self.code.push(Instruction::Mark(end_label));
        Ok(())
    }

    fn increment(&mut self, step: &Increment, reg: Reg) {
        let operator = step.operator.as_str();
        let amount = match operator {
            "++" => String::from("1"),
            "--" => String::from("-1"),

            // La gramática nunca adjunta dígitos al operador de
            // incremento, por lo cual estas formas hoy no son
            // alcanzables desde código fuente
            _ if operator.contains("+=") => operator[2..].to_owned(),
            _ if operator.contains("-=") => format!("-{}", &operator[2..]),

            // Cualquier otro operador de incremento no emite nada
            _ => return,
        };

        self.code.push(Instruction::Addi(reg, reg, amount));
    }

    fn expression(&mut self, expression: &Expression) -> Lower<()> {
        use AssignOp::*;

        let dest = self.reg(&expression.target)?;
        match (expression.op, &expression.rhs) {
            (Set, Rhs::Literal(number)) => {
                self.code.push(Instruction::LoadImm(dest, number.clone()));
            }

            (Set, Rhs::Variable(name)) => {
                let src = self.reg(name)?;
                self.code.push(Instruction::Move(dest, src));
            }

            (Set, Rhs::Binary { base, sign, offset }) => {
                let src = self.reg(base)?;
                let offset = Operand::Imm(offset.clone());
                self.code.push(match sign {
                    Sign::Plus => Instruction::Add(dest, src, offset),
                    Sign::Minus => Instruction::Sub(dest, src, offset),
                });
            }

            (op @ Add, Rhs::Binary { base, sign, offset })
            | (op @ Sub, Rhs::Binary { base, sign, offset }) => {
                let src = self.reg(base)?;
                self.code.push(match op {
                    Add => Instruction::Add(dest, dest, Operand::Reg(src)),
                    _ => Instruction::Sub(dest, dest, Operand::Reg(src)),
                });

                let immediate = match sign {
                    Sign::Plus => offset.clone(),
                    Sign::Minus => format!("-{}", offset),
                };

                self.code.push(Instruction::Addi(dest, dest, immediate));
            }

            // Un operador compuesto sin término secundario no está
            // en la tabla de formas soportadas
            _ => {
                return Err(Located::at(
                    LowerError::UnsupportedExpression(expression.to_string()),
                    expression.target.position(),
                ))
            }
        }

        Ok(())
    }

    fn already_emitted(&self, instruction: &Instruction) -> bool {
        let line = instruction.to_string();
        self.code.iter().any(|emitted| emitted.to_string() == line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex, parse};

    fn lower_source(code: &str) -> Lower<Vec<Instruction>> {
        let (tokens, _) = lex::scan(code);
        let ast = parse::parse(&tokens).expect("parse failed");
        lower(&ast, &RegisterMap::default())
    }

    fn lines(code: &str) -> Vec<String> {
        lower_source(code)
            .expect("lowering failed")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn declarations_become_load_immediates() {
        assert_eq!(
            lines("int a = 3; int b = 4; int i;"),
            vec!["li $t0, 3", "li $t2, 4", "li $t1, 0"]
        );
    }

    #[test]
    fn single_loop_shape() {
        assert_eq!(
            lines("for (i = 0; i <= 3; i++) { a = 1; }"),
            vec![
                "li $t1, 0",
                "LOOP_START:",
                "bgt $t1, 3, LOOP_END",
                "li $t0, 1",
                "addi $t1, $t1, 1",
                "j LOOP_START",
                "LOOP_END:",
            ]
        );
    }

    #[test]
    fn loop_initialization_is_not_duplicated() {
        let lines = lines("int i; for (i = 0; i <= 3; i++) { a = 1; }");
        let loads = lines.iter().filter(|line| *line == "li $t1, 0").count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn parsed_loop_operator_is_discarded() {
        let lines = lines("for (i = 0; i != 3; i--) { a = 1; }");
        assert!(lines.contains(&"bgt $t1, 3, LOOP_END".to_owned()));
        assert!(lines.contains(&"addi $t1, $t1, -1".to_owned()));
    }

    #[test]
    fn expression_forms_follow_the_operation_table() {
        let lines = lines(
            "for (i = 0; i <= 9; i++) { \
             a += i + 2; a -= i - 2; a = i + 1; a = i - 1; a = 5; a = b; }",
        );

        assert_eq!(
            &lines[3..13],
            &[
                "add $t0, $t0, $t1",
                "addi $t0, $t0, 2",
                "sub $t0, $t0, $t1",
                "addi $t0, $t0, -2",
                "add $t0, $t1, 1",
                "sub $t0, $t1, 1",
                "li $t0, 5",
                "move $t0, $t2",
                "addi $t1, $t1, 1",
                "j LOOP_START",
            ]
        );
    }

    #[test]
    fn if_labels_are_unique_within_a_run() {
        let lines = lines(
            "for (i = 0; i <= 3; i++) { \
             if (a == b) { a = 1; } if (a != b) { a = 2; } }",
        );

        assert!(lines.contains(&"beq $t0, $t2, IF_TRUE0".to_owned()));
        assert!(lines.contains(&"bne $t0, $t2, IF_TRUE1".to_owned()));
        assert!(lines.contains(&"END_IF0:".to_owned()));
        assert!(lines.contains(&"END_IF1:".to_owned()));
    }

    #[test]
    fn label_numbering_restarts_between_runs() {
        let source = "for (i = 0; i <= 3; i++) { if (a == b) { a = 1; } }";
        assert_eq!(
            lower_source(source).unwrap(),
            lower_source(source).unwrap()
        );
    }

    #[test]
    fn only_the_first_if_body_statement_is_emitted() {
        let lines = lines("for (i = 0; i <= 3; i++) { if (a == b) { a = 1; a = 2; } }");
        assert!(lines.contains(&"li $t0, 1".to_owned()));
        assert!(!lines.contains(&"li $t0, 2".to_owned()));
    }

    #[test]
    fn empty_if_bodies_lower_to_a_bare_branch_skeleton() {
        let lines = lines("for (i = 0; i <= 3; i++) { if (a == b) { } }");
        let branch = lines.iter().position(|line| line == "IF_TRUE0:").unwrap();
        assert_eq!(lines[branch + 1], "j END_IF0");
    }

    #[test]
    fn unsupported_if_operator_is_fatal() {
        let error =
            lower_source("for (i = 0; i <= 3; i++) { if (a < b) { a = 1; } }").unwrap_err();

        match error.as_ref() {
            LowerError::UnsupportedConditionOperator(operator) => assert_eq!(operator, "<"),
            other => panic!("expected an unsupported operator error, got {:?}", other),
        }
    }

    #[test]
    fn compound_assignment_requires_a_secondary_term() {
        let error = lower_source("for (i = 0; i <= 3; i++) { a += 2; }").unwrap_err();
        assert_eq!(
            error.as_ref().to_string(),
            "Unsupported expression `a += 2`"
        );
    }

    #[test]
    fn unmapped_variables_fail_loudly() {
        let error = lower_source("int x = 1;").unwrap_err();

        match error.as_ref() {
            LowerError::UnmappedVariable(name) => assert_eq!(name, "x"),
            other => panic!("expected an unmapped variable error, got {:?}", other),
        }
    }

    #[test]
    fn empty_program_lowers_to_no_instructions() {
        assert!(lines("").is_empty());
    }
}
