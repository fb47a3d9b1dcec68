//! The questions asked to every islander.
//!
//! The column names must match the header row of the target worksheet
//! exactly, including punctuation and emojis.

use crate::config::{FieldKind, Question};

pub const NAME: &str = "Name";

pub const LOVE_ISLAND: &[Question] = &[
    Question {
        column: NAME,
        prompt: "What is your name?",
        kind: FieldKind::Text,
        required: true,
    },
    Question {
        column: "Are you an extrovert or an introvert?",
        prompt: "Are you an extrovert or an introvert?",
        kind: FieldKind::SingleChoice {
            options: &["Introvert", "Extrovert", "Ambi-vert"],
            default: Some(0),
        },
        required: true,
    },
    Question {
        column: "Choose your dream date",
        prompt: "Choose your dream date:",
        kind: FieldKind::SingleChoice {
            options: &[
                "Movie night 🎬",
                "Mystery date 🎁",
                "Sunset picnic 🌅",
                "Bookstore browse 📚",
                "Explore a neighborhood 🏙️",
            ],
            default: Some(0),
        },
        required: true,
    },
];
