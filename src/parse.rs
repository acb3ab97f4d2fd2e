//! Análisis sintáctico.
//!
//! El parser es descendente recursivo y estrictamente hacia adelante:
//! consume el flujo de tokens una sola vez, con un único token de
//! lookahead y sin backtracking. El nivel superior es tolerante, en
//! el sentido de que un token que no inicia ninguna producción
//! conocida se descarta en silencio; dentro de una producción, en
//! cambio, todo token inesperado es un error fatal.

use std::fmt::{self, Display};
use thiserror::Error;

use crate::{
    lex::{Token, TokenKind},
    source::{Located, Position},
};

/// Árbol sintáctico de un programa completo.
#[derive(Debug)]
pub struct Ast {
    pub statements: Vec<Statement>,
}

/// Un statement del nivel superior.
#[derive(Debug)]
pub enum Statement {
    Declaration(Declaration),
    For(ForLoop),
}

/// `int <nombre> (= <valor>)? ;`
#[derive(Debug)]
pub struct Declaration {
    pub name: Located<String>,
    pub value: String,
}

/// `for (<init>; <condición>; <incremento>) { ... }`
#[derive(Debug)]
pub struct ForLoop {
    pub init: Initialization,
    pub condition: Condition,
    pub step: Increment,
    pub body: Vec<BodyStatement>,
}

/// Un statement dentro del cuerpo de un `for`.
#[derive(Debug)]
pub enum BodyStatement {
    If(IfStatement),
    Expression(Expression),
}

/// `if (<condición>) { ... }`
#[derive(Debug)]
pub struct IfStatement {
    pub condition: Condition,
    pub body: Vec<Expression>,
}

/// `<variable> = <valor>`
#[derive(Debug)]
pub struct Initialization {
    pub variable: Located<String>,
    pub value: String,
}

/// `<variable> <operador> <valor>`
#[derive(Debug)]
pub struct Condition {
    pub variable: Located<String>,
    pub operator: Located<String>,
    pub value: String,
}

/// `<variable> <operador>`
///
/// El operando del operador nunca forma parte del incremento: una
/// forma compuesta como `i += 2` no es expresable en esta gramática.
#[derive(Debug)]
pub struct Increment {
    pub variable: Located<String>,
    pub operator: String,
}

/// Una expresión de asignación, estructurada durante el parsing.
#[derive(Debug)]
pub struct Expression {
    pub target: Located<String>,
    pub op: AssignOp,
    pub rhs: Rhs,
}

/// Operador principal de una expresión.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,

    /// `+=`
    Add,

    /// `-=`
    Sub,
}

/// Lado derecho de una expresión.
#[derive(Debug)]
pub enum Rhs {
    /// Constante numérica sola.
    Literal(String),

    /// Variable sola.
    Variable(Located<String>),

    /// `<base> (+|-) <constante>`
    Binary {
        base: Located<String>,
        sign: Sign,
        offset: String,
    },
}

/// Operador secundario de una expresión.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Display for AssignOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
        })
    }
}

impl Display for Sign {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        })
    }
}

impl Display for Expression {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} {} ", self.target.as_ref(), self.op)?;
        match &self.rhs {
            Rhs::Literal(number) => fmt.write_str(number),
            Rhs::Variable(name) => fmt.write_str(name.as_ref()),
            Rhs::Binary { base, sign, offset } => {
                write!(fmt, "{} {} {}", base.as_ref(), sign, offset)
            }
        }
    }
}

/// Aquello que el parser esperaba encontrar al fallar.
#[derive(Clone, Debug)]
pub enum Expectation {
    /// Cualquier token de una clase.
    Kind(TokenKind),

    /// Un token exacto.
    Exact(TokenKind, &'static str),

    /// Un identificador o una constante numérica.
    Value,
}

impl Display for Expectation {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Kind(TokenKind::Identifier) => fmt.write_str("an identifier"),
            Expectation::Kind(TokenKind::Number) => fmt.write_str("a number"),
            Expectation::Kind(kind) => write!(fmt, "a {}", kind),
            Expectation::Exact(kind, text) => write!(fmt, "{} `{}`", kind, text),
            Expectation::Value => fmt.write_str("an identifier or a number"),
        }
    }
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Expected {0}, found {1}")]
    UnexpectedToken(Expectation, Token),

    #[error("Expected {0}, but the token stream ended")]
    UnexpectedEof(Expectation),

    #[error("Unsupported operator `{0}` in expression")]
    UnsupportedOperator(String),
}

pub type Parse<T> = Result<T, Located<ParserError>>;

/// Construye el árbol sintáctico de un flujo completo de tokens.
pub fn parse(tokens: &[Located<Token>]) -> Parse<Ast> {
    let parser = Parser {
        tokens,
        current: 0,
        last_known: Position::default(),
    };

    parser.program()
}

struct Parser<'a> {
    tokens: &'a [Located<Token>],
    current: usize,
    last_known: Position,
}

impl<'a> Parser<'a> {
    fn program(mut self) -> Parse<Ast> {
        let mut statements = Vec::new();
        while let Some(token) = self.peek() {
            match (token.as_ref().kind, token.as_ref().text.as_str()) {
                (TokenKind::Keyword, "int") => {
                    statements.push(Statement::Declaration(self.declaration()?))
                }

                (TokenKind::Keyword, "for") => statements.push(Statement::For(self.for_loop()?)),

                // Tolerancia del nivel superior: cualquier otro token
                // se descarta sin diagnóstico
                _ => self.current += 1,
            }
        }

        Ok(Ast { statements })
    }

    fn declaration(&mut self) -> Parse<Declaration> {
        self.expect(TokenKind::Keyword, "int")?;
        let name = self.identifier()?;

        // Sin inicializador explícito, la variable arranca en cero
        let mut value = String::from("0");
        if let Some(token) = self.peek() {
            if token.as_ref().kind == TokenKind::Operator && token.as_ref().text == "=" {
                self.expect(TokenKind::Operator, "=")?;
                value = self.value()?.as_ref().text.clone();
            }
        }

        self.expect(TokenKind::Punctuation, ";")?;
        Ok(Declaration { name, value })
    }

    fn for_loop(&mut self) -> Parse<ForLoop> {
        self.expect(TokenKind::Keyword, "for")?;
        self.expect(TokenKind::Punctuation, "(")?;

        let init = self.initialization()?;
        self.expect(TokenKind::Punctuation, ";")?;

        let condition = self.condition()?;
        self.expect(TokenKind::Punctuation, ";")?;

        let step = self.increment()?;
        self.expect(TokenKind::Punctuation, ")")?;

        self.expect(TokenKind::Punctuation, "{")?;
        let mut body = Vec::new();
        while let Some(token) = self.peek() {
            match (token.as_ref().kind, token.as_ref().text.as_str()) {
                (TokenKind::Punctuation, "}") => break,
                (TokenKind::Keyword, "if") => body.push(BodyStatement::If(self.if_statement()?)),
                _ => body.push(BodyStatement::Expression(self.expression()?)),
            }
        }

        self.expect(TokenKind::Punctuation, "}")?;
        Ok(ForLoop {
            init,
            condition,
            step,
            body,
        })
    }

    fn if_statement(&mut self) -> Parse<IfStatement> {
        self.expect(TokenKind::Keyword, "if")?;
        self.expect(TokenKind::Punctuation, "(")?;
        let condition = self.condition()?;
        self.expect(TokenKind::Punctuation, ")")?;

        self.expect(TokenKind::Punctuation, "{")?;
        let mut body = Vec::new();
        while let Some(token) = self.peek() {
            if token.as_ref().kind == TokenKind::Punctuation && token.as_ref().text == "}" {
                break;
            }

            body.push(self.expression()?);
        }

        self.expect(TokenKind::Punctuation, "}")?;
        Ok(IfStatement { condition, body })
    }

    fn initialization(&mut self) -> Parse<Initialization> {
        let variable = self.identifier()?;
        self.expect(TokenKind::Operator, "=")?;
        let value = self.value()?.as_ref().text.clone();

        Ok(Initialization { variable, value })
    }

    fn condition(&mut self) -> Parse<Condition> {
        let variable = self.identifier()?;

        let operator = self.kind(TokenKind::Operator)?;
        let operator = Located::at(operator.as_ref().text.clone(), operator.position());

        let value = self.value()?.as_ref().text.clone();
        Ok(Condition {
            variable,
            operator,
            value,
        })
    }

    fn increment(&mut self) -> Parse<Increment> {
        let variable = self.identifier()?;
        let operator = self.kind(TokenKind::Operator)?.as_ref().text.clone();

        Ok(Increment { variable, operator })
    }

    fn expression(&mut self) -> Parse<Expression> {
        let target = self.identifier()?;

        let operator = self.kind(TokenKind::Operator)?;
        let op = match operator.as_ref().text.as_str() {
            "=" => AssignOp::Set,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            other => {
                return Err(Located::at(
                    ParserError::UnsupportedOperator(other.to_owned()),
                    operator.position(),
                ))
            }
        };

        let first = self.value()?;
        let rhs = match self.peek() {
            // Término secundario: `<base> (+|-) <constante>`
            Some(token) if token.as_ref().kind == TokenKind::Operator => {
                let sign = match token.as_ref().text.as_str() {
                    "+" => Sign::Plus,
                    "-" => Sign::Minus,
                    other => {
                        return Err(Located::at(
                            ParserError::UnsupportedOperator(other.to_owned()),
                            token.position(),
                        ))
                    }
                };

                self.next(Expectation::Kind(TokenKind::Operator))?;
                let offset = self.kind(TokenKind::Number)?.as_ref().text.clone();

                Rhs::Binary {
                    base: Located::at(first.as_ref().text.clone(), first.position()),
                    sign,
                    offset,
                }
            }

            _ => match first.as_ref().kind {
                TokenKind::Number => Rhs::Literal(first.as_ref().text.clone()),
                _ => Rhs::Variable(Located::at(first.as_ref().text.clone(), first.position())),
            },
        };

        self.expect(TokenKind::Punctuation, ";")?;
        Ok(Expression { target, op, rhs })
    }

    fn identifier(&mut self) -> Parse<Located<String>> {
        let token = self.kind(TokenKind::Identifier)?;
        Ok(Located::at(token.as_ref().text.clone(), token.position()))
    }

    /// Consume el siguiente token, que debe ser un identificador o
    /// una constante numérica.
    fn value(&mut self) -> Parse<&'a Located<Token>> {
        let token = self.next(Expectation::Value)?;
        match token.as_ref().kind {
            TokenKind::Identifier | TokenKind::Number => Ok(token),
            _ => Err(unexpected(Expectation::Value, token)),
        }
    }

    /// Consume el siguiente token, que debe ser de una clase exacta.
    fn kind(&mut self, kind: TokenKind) -> Parse<&'a Located<Token>> {
        let token = self.next(Expectation::Kind(kind))?;
        if token.as_ref().kind == kind {
            Ok(token)
        } else {
            Err(unexpected(Expectation::Kind(kind), token))
        }
    }

    /// Consume el siguiente token, que debe ser exactamente el esperado.
    fn expect(&mut self, kind: TokenKind, text: &'static str) -> Parse<&'a Located<Token>> {
        let token = self.next(Expectation::Exact(kind, text))?;
        if token.as_ref().kind == kind && token.as_ref().text == text {
            Ok(token)
        } else {
            Err(unexpected(Expectation::Exact(kind, text), token))
        }
    }

    fn peek(&self) -> Option<&'a Located<Token>> {
        self.tokens.get(self.current)
    }

    /// Avanza el cursor. Agotar el flujo a mitad de una producción
    /// es un error fatal, no una señal de fin de entrada.
    fn next(&mut self, expected: Expectation) -> Parse<&'a Located<Token>> {
        match self.tokens.get(self.current) {
            Some(token) => {
                self.current += 1;
                self.last_known = token.position();
                Ok(token)
            }

            None => Err(Located::at(
                ParserError::UnexpectedEof(expected),
                self.last_known,
            )),
        }
    }
}

fn unexpected(expected: Expectation, token: &Located<Token>) -> Located<ParserError> {
    Located::at(
        ParserError::UnexpectedToken(expected, token.as_ref().clone()),
        token.position(),
    )
}
