//! Treeviz formatter for expansion trees
//!
//! One line per node, nesting shown with box-drawing connectors, so a derivation
//! can be scanned top to bottom like the sentence it produces.
//!
//! So the format is :
//! <prefix><connector> <icon> <label>
//!
//! Example:
//!
//!     └─ ≔ T #1
//!       ├─ ≔ V #0
//!       │ └─ ◦ grab
//!       ├─ ◦ the
//!       └─ ⋯ O
//!
//! Icons
//!     Rule (expanded through option #n): ≔
//!     Terminal: ◦
//!     Reference (left unexpanded): ⋯

use crate::fcfg::enumeration::Expansion;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

pub fn get_icon(expansion: &Expansion) -> &'static str {
    match expansion {
        Expansion::Rule { .. } => "≔",
        Expansion::Terminal(_) => "◦",
        Expansion::Reference(_) => "⋯",
    }
}

fn label(expansion: &Expansion) -> String {
    match expansion {
        Expansion::Rule { name, option, .. } => format!("{} #{}", name, option),
        Expansion::Terminal(word) | Expansion::Reference(word) => word.clone(),
    }
}

pub fn to_treeviz_str(expansion: &Expansion) -> String {
    let mut result = String::new();
    append_node(&mut result, expansion, "", true);
    result
}

fn append_node(result: &mut String, expansion: &Expansion, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    result.push_str(&format!(
        "{}{} {} {}\n",
        prefix,
        connector,
        get_icon(expansion),
        truncate(&label(expansion), 30)
    ));

    if let Expansion::Rule { children, .. } = expansion {
        let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
        for (i, child) in children.iter().enumerate() {
            append_node(result, child, &new_prefix, i == children.len() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcfg::compiling::compile;
    use crate::fcfg::enumeration::Enumeration;

    #[test]
    fn test_expansion_tree() {
        let grammar = compile("T -> go D | V the O\nD -> left | right\nV -> grab | take\nO -> cup").unwrap();
        let tree = Enumeration::new(&grammar, "T", 2).iter().nth(2).unwrap();
        insta::assert_snapshot!(to_treeviz_str(&tree), @r"
        └─ ≔ T #1
          ├─ ≔ V #0
          │ └─ ◦ grab
          ├─ ◦ the
          └─ ≔ O #0
            └─ ◦ cup
        ");
    }

    #[test]
    fn test_opaque_root() {
        let tree = Expansion::Reference("T".into());
        assert_eq!(to_treeviz_str(&tree), "└─ ⋯ T\n");
    }

    #[test]
    fn test_long_labels_are_truncated() {
        let tree = Expansion::Terminal("a".repeat(40));
        assert_eq!(to_treeviz_str(&tree), format!("└─ ◦ {}...\n", "a".repeat(30)));
    }
}
