use std::fmt;
use std::fmt::{Display, Formatter};

/// A single annotation token found between the parentheses of a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Get,
    Set,
    Const,
    Final,
    Hidden,
    Writable,
}
impl Flag {
    pub const ALL: [Flag; 6] = [
        Flag::Get,
        Flag::Set,
        Flag::Const,
        Flag::Final,
        Flag::Hidden,
        Flag::Writable,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Flag::Get => "get",
            Flag::Set => "set",
            Flag::Const => "const",
            Flag::Final => "final",
            Flag::Hidden => "hidden",
            Flag::Writable => "writable",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Flag::Get => 1,
            Flag::Set => 1 << 1,
            Flag::Const => 1 << 2,
            Flag::Final => 1 << 3,
            Flag::Hidden => 1 << 4,
            Flag::Writable => 1 << 5,
        }
    }
}
impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Unordered set of flags. Repeating a flag is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSet(u8);
impl FlagSet {
    pub fn empty() -> Self {
        FlagSet(0)
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn union(&self, other: FlagSet) -> FlagSet {
        FlagSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_accessor(&self) -> bool {
        self.contains(Flag::Get) || self.contains(Flag::Set)
    }

    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        Flag::ALL.iter().copied().filter(move |f| self.contains(*f))
    }
}
impl std::iter::FromIterator<Flag> for FlagSet {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        let mut set = FlagSet::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}
impl Display for FlagSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self.iter().map(|flag| flag.keyword()).collect();
        write!(f, "({})", words.join(" "))
    }
}

/// A property key with its annotation stripped off.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedName {
    pub flags: FlagSet,
    pub name: String,
}
impl Display for AnnotatedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flags, self.name)
    }
}
