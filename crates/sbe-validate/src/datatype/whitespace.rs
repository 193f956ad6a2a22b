use std::str::FromStr;

/// The `whiteSpace` facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhiteSpace {
    Preserve,
    /// Tab, newline and carriage return become spaces.
    Replace,
    /// Replace, then squeeze runs of spaces and trim.
    Collapse,
}

impl WhiteSpace {
    pub fn normalize(self, value: &str) -> String {
        match self {
            WhiteSpace::Preserve => value.to_string(),
            WhiteSpace::Replace => value
                .chars()
                .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
                .collect(),
            WhiteSpace::Collapse => value
                .split(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl FromStr for WhiteSpace {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_modes() {
        let raw = "\t a \n b  ";
        assert_eq!(WhiteSpace::Preserve.normalize(raw), raw);
        assert_eq!(WhiteSpace::Replace.normalize(raw), "  a   b  ");
        assert_eq!(WhiteSpace::Collapse.normalize(raw), "a b");
    }
}
