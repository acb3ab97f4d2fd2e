//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del traductor. Descompone el código fuente
//! en unidades léxicas denominadas tokens. Los espacios en blanco se
//! descartan durante esta operación. Cada token emitido está asociado
//! a la posición de su primer carácter en el código fuente original,
//! lo cual permite rastrear errores tanto en los mismos como en
//! constructos más elevados de fases posteriores.
//!
//! # Contenido de un token
//! Todo token conserva su lexema original junto a su clase léxica.
//! Las fases posteriores dirigen su análisis a partir de la clase y,
//! cuando es necesario, del texto exacto del lexema.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave son `for`, `int` e `if`; cualquier otra
//!   palabra es un identificador.
//! - Las constantes numéricas son corridas maximales de dígitos.
//! - Un operador toma dos caracteres cuando el carácter que sigue
//!   inmediatamente puede continuar un operador, como en `<=` o `++`.
//!
//! # Errores
//! El escaneo nunca es fatal. Un carácter que no pertenece al
//! lenguaje se descarta con un diagnóstico y el escaneo continúa
//! con el siguiente carácter.

use crate::source::{self, Located, Position};
use std::{
    fmt::{self, Display},
    iter::Peekable,
};

use thiserror::Error;

/// Caracteres que pueden iniciar o continuar un operador.
const OPERATORS: &str = "+-*/<=>!";

/// Caracteres de puntuación.
const PUNCTUATION: &str = "(){};";

/// Diagnóstico de escaneo. Nunca detiene la traducción.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),
}

/// Clase léxica de un token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    Operator,
    Punctuation,
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Operator => "operator",
            TokenKind::Punctuation => "punctuation",
        };

        fmt.write_str(name)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir
/// completamente a una entidad léxica del programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: String) -> Self {
        Token { kind, text }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} `{}`", self.kind, self.text)
    }
}

/// Descompone código fuente en tokens y diagnósticos no fatales.
///
/// Los tokens anteriores y posteriores a un carácter inesperado se
/// producen de igual forma; el diagnóstico solamente queda registrado.
pub fn scan(code: &str) -> (Vec<Located<Token>>, Vec<Located<LexerError>>) {
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    for result in Lexer::new(source::consume(code)) {
        match result {
            Ok(token) => tokens.push(token),
            Err(error) => diagnostics.push(error),
        }
    }

    (tokens, diagnostics)
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La salida
/// del lexer, así como su siguiente estado, se define a partir de
/// tanto su estado actual como el siguiente carácter encontrado en
/// el flujo de entrada.
pub struct Lexer<S: Iterator<Item = (char, Position)>> {
    source: Peekable<S>,
    state: State,
    start: Position,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido
    /// y vuelve a [`State::Start`].
    Complete(Token),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),

    /// Constante numérica.
    Integer(String),

    /// Se encontró el primer carácter de un operador.
    ///
    /// Si el siguiente carácter también puede continuar un operador,
    /// ambos forman un único token de dos caracteres.
    Operator(char),
}

impl<S: Iterator<Item = (char, Position)>> Lexer<S> {
    /// Crea un lexer en estado inicial a partir de un flujo.
    pub fn new(source: S) -> Self {
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start: Position::default(),
        }
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Option<Result<Token, LexerError>> {
        use State::*;

        let token = loop {
            let next = self.source.peek().copied();

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let (Start, Some((_, position))) = (&self.state, next) {
                self.start = position;
            }

            // Switch table principal, determina cambios de estado y
            // de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next.map(|(c, _)| c)) {
                (Start, None) => return None,
                (Start, Some(c)) if c.is_ascii_whitespace() => (),
                (Start, Some(c)) if c.is_ascii_digit() => self.state = Integer(c.to_string()),
                (Start, Some(c)) if c.is_ascii_alphabetic() => self.state = Word(c.to_string()),
                (Start, Some(c)) if OPERATORS.contains(c) => self.state = Operator(c),

                (Start, Some(c)) if PUNCTUATION.contains(c) => {
                    self.state = Complete(Token::new(TokenKind::Punctuation, c.to_string()))
                }

                // El carácter inesperado se descarta para poder
                // continuar con el siguiente
                (Start, Some(c)) => {
                    self.source.next();
                    break Err(LexerError::BadChar(c));
                }

                // Emisión retardada de tokens ya decididos
                (Complete(token), _) => {
                    let placeholder = Token::new(TokenKind::Punctuation, String::new());
                    break Ok(std::mem::replace(token, placeholder));
                }

                // Acumulación dígito por dígito de constantes numéricas
                (Integer(digits), Some(c)) if c.is_ascii_digit() => digits.push(c),

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer(digits), _) => {
                    break Ok(Token::new(TokenKind::Number, std::mem::take(digits)))
                }

                // Extensión de términos
                (Word(word), Some(c)) if c.is_ascii_alphanumeric() => word.push(c),

                // Si sigue algo que no puede formar parte del término,
                // este se resuelve a palabra clave o identificador
                (Word(word), _) => {
                    let word = std::mem::take(word);
                    let kind = match word.as_str() {
                        "for" | "int" | "if" => TokenKind::Keyword,
                        _ => TokenKind::Identifier,
                    };

                    break Ok(Token::new(kind, word));
                }

                // Un operador absorbe al siguiente carácter si este
                // puede continuar un operador de dos caracteres
                (Operator(first), Some(c)) if OPERATORS.contains(c) => {
                    let text = [*first, c].iter().collect();
                    self.state = Complete(Token::new(TokenKind::Operator, text));
                }

                (Operator(first), _) => {
                    break Ok(Token::new(TokenKind::Operator, first.to_string()))
                }
            }

            // Si no hubo `break`, aquí se consume el carácter que se
            // observó con lookahead anteriormente
            self.source.next();
        };

        Some(token)
    }
}

impl<S: Iterator<Item = (char, Position)>> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.lex()?;
        self.state = State::Start;

        Some(match result {
            Ok(token) => Ok(Located::at(token, self.start)),
            Err(error) => Err(Located::at(error, self.start)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(code: &str) -> Vec<(TokenKind, String)> {
        let (tokens, diagnostics) = scan(code);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);

        tokens
            .into_iter()
            .map(|token| {
                let token = token.into_inner();
                (token.kind, token.text)
            })
            .collect()
    }

    #[test]
    fn scans_a_declaration() {
        use TokenKind::*;

        assert_eq!(
            texts("int a = 3;"),
            vec![
                (Keyword, "int".to_owned()),
                (Identifier, "a".to_owned()),
                (Operator, "=".to_owned()),
                (Number, "3".to_owned()),
                (Punctuation, ";".to_owned()),
            ]
        );
    }

    #[test]
    fn combines_two_character_operators() {
        let operators: Vec<_> = texts("i <= 3; i++; a != b; a += 2")
            .into_iter()
            .filter(|(kind, _)| *kind == TokenKind::Operator)
            .map(|(_, text)| text)
            .collect();

        assert_eq!(operators, vec!["<=", "++", "!=", "+="]);
    }

    #[test]
    fn numbers_are_maximal_digit_runs() {
        use TokenKind::*;

        assert_eq!(
            texts("1234 56"),
            vec![(Number, "1234".to_owned()), (Number, "56".to_owned())]
        );
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        let kinds: Vec<_> = texts("for int if forx iff")
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();

        use TokenKind::*;
        assert_eq!(kinds, vec![Keyword, Keyword, Keyword, Identifier, Identifier]);
    }

    #[test]
    fn bad_characters_warn_and_scanning_continues() {
        let (tokens, diagnostics) = scan("int a# = 3;");

        assert_eq!(tokens.len(), 5);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0].as_ref(), LexerError::BadChar('#')));
        assert_eq!(diagnostics[0].position().line(), 1);
        assert_eq!(diagnostics[0].position().column(), 6);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        let (tokens, diagnostics) = scan("");
        assert!(tokens.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn tokens_carry_their_positions() {
        let (tokens, _) = scan("int a;\n  b");

        assert_eq!(tokens[0].position().to_string(), "1:1");
        assert_eq!(tokens[1].position().to_string(), "1:5");
        assert_eq!(tokens[2].position().to_string(), "1:6");
        assert_eq!(tokens[3].position().to_string(), "2:3");
    }
}
