/// Textual names carry their sigil: variables `%x`, labels `:loop`,
/// functions `@main`, registers bare (`rax`). Keeping the sigil in the
/// name lets every liveness set and coloring map be a plain set of `Id`s.
pub type Id = String;

/// Strips the sigil from a name (`"@main"` -> `"main"`).
pub fn base_name(id: &str) -> &str {
    match id.as_bytes().first() {
        Some(b'%') | Some(b':') | Some(b'@') => &id[1..],
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_sigils() {
        assert_eq!(base_name("@main"), "main");
        assert_eq!(base_name(":loop"), "loop");
        assert_eq!(base_name("%v"), "v");
        assert_eq!(base_name("rax"), "rax");
    }
}
