//! Serialización del listado de instrucciones.

use crate::ir::Instruction;
use std::io::{self, Write};

/// Escribe el listado acumulado, una instrucción o etiqueta por
/// línea, sin reordenar ni validar.
pub fn write<W: Write>(code: &[Instruction], output: &mut W) -> io::Result<()> {
    for instruction in code {
        writeln!(output, "{}", instruction)?;
    }

    Ok(())
}

/// Serializa el listado en memoria.
pub fn to_string(code: &[Instruction]) -> String {
    code.iter().fold(String::new(), |mut text, instruction| {
        text.push_str(&instruction.to_string());
        text.push('\n');
        text
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Label, Reg};

    #[test]
    fn one_line_per_instruction() {
        let code = vec![
            Instruction::LoadImm(Reg("$t0"), "3".to_owned()),
            Instruction::Mark(Label::LoopStart),
            Instruction::Jump(Label::LoopStart),
        ];

        assert_eq!(to_string(&code), "li $t0, 3\nLOOP_START:\nj LOOP_START\n");

        let mut buffer = Vec::new();
        write(&code, &mut buffer).unwrap();
        assert_eq!(buffer, to_string(&code).into_bytes());
    }

    #[test]
    fn an_empty_listing_serializes_to_nothing() {
        assert_eq!(to_string(&[]), "");
    }
}
