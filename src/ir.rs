use std::fmt::{self, Display};

/// Registro físico de la máquina objetivo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reg(pub &'static str);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Label {
    LoopStart,
    LoopEnd,
    IfTrue(u32),
    IfFalse(u32),
    IfEnd(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    LoadImm(Reg, String),
    Move(Reg, Reg),
    Add(Reg, Reg, Operand),
    Addi(Reg, Reg, String),
    Sub(Reg, Reg, Operand),
    BranchEq(Reg, Reg, Label),
    BranchNe(Reg, Reg, Label),
    BranchGt(Reg, String, Label),
    Jump(Label),
    Mark(Label),
}

impl Display for Reg {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Reg(name) = self;
        fmt.write_str(name)
    }
}

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Label::*;

        match self {
            LoopStart => fmt.write_str("LOOP_START"),
            LoopEnd => fmt.write_str("LOOP_END"),
            IfTrue(number) => write!(fmt, "IF_TRUE{}", number),
            IfFalse(number) => write!(fmt, "IF_FALSE{}", number),
            IfEnd(number) => write!(fmt, "END_IF{}", number),
        }
    }
}

impl Display for Operand {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => reg.fmt(fmt),
            Operand::Imm(text) => fmt.write_str(text),
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match self {
            LoadImm(reg, value) => write!(fmt, "li {}, {}", reg, value),
            Move(to, from) => write!(fmt, "move {}, {}", to, from),
            Add(to, left, right) => write!(fmt, "add {}, {}, {}", to, left, right),
            Addi(to, from, imm) => write!(fmt, "addi {}, {}, {}", to, from, imm),
            Sub(to, left, right) => write!(fmt, "sub {}, {}, {}", to, left, right),
            BranchEq(left, right, label) => write!(fmt, "beq {}, {}, {}", left, right, label),
            BranchNe(left, right, label) => write!(fmt, "bne {}, {}, {}", left, right, label),
            BranchGt(reg, value, label) => write!(fmt, "bgt {}, {}, {}", reg, value, label),
            Jump(label) => write!(fmt, "j {}", label),
            Mark(label) => write!(fmt, "{}:", label),
        }
    }
}
