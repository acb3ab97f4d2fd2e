//! Traductor para un subconjunto procedural restringido.
//!
//! # Front end
//! Cada programa deriva de una única cadena de código fuente. Esta
//! se somete primero a análisis léxico en [`lex`], de lo cual se
//! obtiene un flujo de tokens con posiciones de [`source`]. El flujo
//! de tokens se dispone en un árbol sintáctico por medio de análisis
//! descendente recursivo en [`parse`].
//!
//! # Back end
//! El árbol se traduce en [`lower`] a la secuencia de instrucciones
//! descrita en [`ir`], dirigida a una máquina de registros simple:
//! las variables se asignan a registros físicos mediante una tabla
//! cerrada y las estructuras de control se reducen a saltos y
//! etiquetas. La secuencia se serializa como texto plano en [`emit`],
//! una instrucción o etiqueta por línea.

use thiserror::Error;

pub mod emit;
pub mod ir;
pub mod lex;
pub mod lower;
pub mod parse;
pub mod source;

use crate::{
    lex::LexerError,
    lower::{LowerError, RegisterMap},
    parse::ParserError,
    source::Located,
};

/// Error fatal de cualquier fase de la traducción.
///
/// Un error fatal detiene la corrida de inmediato; ninguna salida
/// parcial acumulada hasta ese punto debe considerarse válida.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Parse(#[from] Located<ParserError>),

    #[error(transparent)]
    Lower(#[from] Located<LowerError>),
}

/// Salida de una traducción completa.
pub struct Translation {
    /// Texto ensamblador final.
    pub assembly: String,

    /// Diagnósticos léxicos no fatales acumulados durante el escaneo.
    pub warnings: Vec<Located<LexerError>>,
}

/// Ejecuta la pipeline completa sobre una cadena de código fuente.
///
/// Cada corrida es dueña exclusiva de sus tokens, árbol e
/// instrucciones; dos corridas independientes producen salidas
/// idénticas para la misma entrada, incluyendo la numeración de
/// etiquetas de `if`.
pub fn translate(code: &str) -> Result<Translation, TranslateError> {
    let (tokens, warnings) = lex::scan(code);
    let ast = parse::parse(&tokens)?;
    let program = lower::lower(&ast, &RegisterMap::default())?;

    Ok(Translation {
        assembly: emit::to_string(&program),
        warnings,
    })
}
