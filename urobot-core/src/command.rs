//! Motion commands announced by the robot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Motion command, one per ensemble member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Left,
    Right,
    Straight,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Left, Command::Right, Command::Straight];

    /// Maps an ensemble member index to its command.
    pub fn from_index(index: usize) -> Option<Command> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Command::Left => 0,
            Command::Right => 1,
            Command::Straight => 2,
        }
    }

    /// The word spoken for this command.
    pub fn word(self) -> &'static str {
        match self {
            Command::Left => "left",
            Command::Right => "right",
            Command::Straight => "straight",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bijection() {
        for (i, cmd) in Command::ALL.iter().enumerate() {
            assert_eq!(Command::from_index(i), Some(*cmd));
            assert_eq!(cmd.index(), i);
        }
        assert_eq!(Command::from_index(3), None);
    }

    #[test]
    fn test_words() {
        assert_eq!(Command::Left.word(), "left");
        assert_eq!(Command::Right.word(), "right");
        assert_eq!(Command::Straight.to_string(), "straight");
    }
}
