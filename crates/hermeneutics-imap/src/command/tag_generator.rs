//! Command tags.

/// Hands out `H0001`, `H0002` and so on.
///
/// The number widens past four digits rather than wrapping at `H9999`.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    issued: u32,
}

impl TagGenerator {
    /// A generator whose tags start with `prefix`.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, issued: 0 }
    }

    /// The next unused tag.
    pub fn next_tag(&mut self) -> String {
        self.issued = self.issued.wrapping_add(1);
        format!("{}{:04}", self.prefix, self.issued)
    }

    /// How many tags were issued so far.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.issued
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('H')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_from_one() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next_tag(), "H0001");
        assert_eq!(tags.next_tag(), "H0002");
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn widens_after_four_digits() {
        let mut tags = TagGenerator {
            prefix: 'A',
            issued: 9999,
        };
        assert_eq!(tags.next_tag(), "A10000");
    }
}
