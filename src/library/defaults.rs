// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in styles shipped with the trainer.

use super::{DanceStyle, Level, Move};

const PLACEHOLDER_MEDIA: &str = "https://picsum.photos/400/225";

fn with_media(mut mv: Move) -> Move {
    mv.media_ref = Some(PLACEHOLDER_MEDIA.to_string());
    mv
}

pub(super) fn initial_styles() -> Vec<DanceStyle> {
    vec![
        DanceStyle {
            id: "salsa-1".to_string(),
            name: "Сальса".to_string(),
            description: "Энергичный и жизнерадостный социальный танец, зародившийся на Карибах."
                .to_string(),
            moves: vec![
                with_media(Move::new("s1", "Базовый шаг", Level::Beginner)),
                with_media(Move::new("s2", "Правый поворот", Level::Beginner)),
                with_media(Move::new("s3", "Cross Body Lead", Level::Intermediate)),
                with_media(Move::new("s4", "Dile Que No", Level::Intermediate)),
            ],
        },
        DanceStyle {
            id: "bachata-1".to_string(),
            name: "Бачата".to_string(),
            description: "Чувственный и ритмичный танец из Доминиканской Республики.".to_string(),
            moves: vec![
                with_media(Move::new("b1", "Базовый шаг (в сторону)", Level::Beginner)),
                with_media(Move::new("b2", "Квадрат (Box Step)", Level::Beginner)),
                with_media(Move::new("b3", "Sweetheart", Level::Intermediate)),
            ],
        },
    ]
}
