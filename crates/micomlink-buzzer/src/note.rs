use std::fmt;

/// The playable scale, C4 through C5.
///
/// The discriminant is the selector byte carried as the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Note {
    C4 = 1,
    D4 = 2,
    E4 = 3,
    F4 = 4,
    G4 = 5,
    A4 = 6,
    B4 = 7,
    C5 = 8,
}

impl Note {
    pub const ALL: [Note; 8] = [
        Note::C4,
        Note::D4,
        Note::E4,
        Note::F4,
        Note::G4,
        Note::A4,
        Note::B4,
        Note::C5,
    ];

    /// Look up a note by selector byte.
    pub fn from_selector(selector: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|note| note.selector() == selector)
    }

    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Equal-tempered pitch, A4 = 440 Hz.
    pub fn frequency_hz(self) -> f64 {
        match self {
            Note::C4 => 261.63,
            Note::D4 => 293.66,
            Note::E4 => 329.63,
            Note::F4 => 349.23,
            Note::G4 => 392.00,
            Note::A4 => 440.00,
            Note::B4 => 493.88,
            Note::C5 => 523.25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Note::C4 => "C",
            Note::D4 => "D",
            Note::E4 => "E",
            Note::F4 => "F",
            Note::G4 => "G",
            Note::A4 => "A",
            Note::B4 => "B",
            Note::C5 => "C5",
        }
    }
}

impl TryFrom<u8> for Note {
    type Error = u8;

    fn try_from(selector: u8) -> Result<Self, u8> {
        Self::from_selector(selector).ok_or(selector)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} Hz)", self.name(), self.frequency_hz())
    }
}
