use ir::l2::Reg;

/// The graph nodes: every general-purpose register except `rsp`.
pub static GP_REGISTERS: [Reg; 15] = [
    Reg::Rdi,
    Reg::Rsi,
    Reg::Rdx,
    Reg::Rcx,
    Reg::R8,
    Reg::R9,
    Reg::Rax,
    Reg::Rbx,
    Reg::Rbp,
    Reg::R10,
    Reg::R11,
    Reg::R12,
    Reg::R13,
    Reg::R14,
    Reg::R15,
];

/// Color preference order for select; caller-saves first.
pub static COLOR_ORDER: [Reg; 15] = [
    Reg::R10,
    Reg::R11,
    Reg::R8,
    Reg::R9,
    Reg::Rax,
    Reg::Rcx,
    Reg::Rdx,
    Reg::Rsi,
    Reg::Rdi,
    Reg::Rbx,
    Reg::Rbp,
    Reg::R12,
    Reg::R13,
    Reg::R14,
    Reg::R15,
];

pub const NUM_COLORS: usize = 15;
