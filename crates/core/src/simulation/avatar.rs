//! Avatar video selection.
//!
//! Eight pre-rendered clips cover every gender/age-group pair. Anything the
//! selector cannot classify falls back to the male clip of the same age group.

use std::fmt;

use log::debug;

pub const DEFAULT_AVATAR_VIDEO: &str = "male-adult.mp4";

pub const ALLOWED_AVATAR_VIDEOS: [&str; 8] = [
    "male-young.mp4",
    "male-adult.mp4",
    "male-middle.mp4",
    "male-senior.mp4",
    "female-young.mp4",
    "female-adult.mp4",
    "female-middle.mp4",
    "female-senior.mp4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Young,
    Adult,
    Middle,
    Senior,
}

impl AgeGroup {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=25 => AgeGroup::Young,
            26..=40 => AgeGroup::Adult,
            41..=60 => AgeGroup::Middle,
            _ => AgeGroup::Senior,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgeGroup::Young => "young",
            AgeGroup::Adult => "adult",
            AgeGroup::Middle => "middle",
            AgeGroup::Senior => "senior",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarGender {
    Male,
    Female,
}

impl AvatarGender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "female" | "f" | "woman" => AvatarGender::Female,
            // Non-binary and unrecognised values use the male clips.
            _ => AvatarGender::Male,
        }
    }
}

impl fmt::Display for AvatarGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AvatarGender::Male => "male",
            AvatarGender::Female => "female",
        })
    }
}

pub fn avatar_video_filename(age: u32, gender: &str) -> String {
    let filename = format!(
        "{}-{}.mp4",
        AvatarGender::parse(gender),
        AgeGroup::from_age(age)
    );
    debug!(
        "Avatar selection: age={} gender='{}' -> {}",
        age, gender, filename
    );
    filename
}

pub fn is_allowed_avatar_video(filename: &str) -> bool {
    ALLOWED_AVATAR_VIDEOS.contains(&filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(18), AgeGroup::Young);
        assert_eq!(AgeGroup::from_age(25), AgeGroup::Young);
        assert_eq!(AgeGroup::from_age(26), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(40), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(41), AgeGroup::Middle);
        assert_eq!(AgeGroup::from_age(60), AgeGroup::Middle);
        assert_eq!(AgeGroup::from_age(61), AgeGroup::Senior);
    }

    #[test]
    fn gender_normalization() {
        assert_eq!(AvatarGender::parse(" Woman "), AvatarGender::Female);
        assert_eq!(AvatarGender::parse("F"), AvatarGender::Female);
        assert_eq!(AvatarGender::parse("man"), AvatarGender::Male);
        assert_eq!(AvatarGender::parse("non-binary"), AvatarGender::Male);
    }

    #[test]
    fn filenames_are_always_allowlisted() {
        for age in [1, 25, 33, 52, 90] {
            for gender in ["male", "female", "other", ""] {
                let name = avatar_video_filename(age, gender);
                assert!(is_allowed_avatar_video(&name), "{name} not allowlisted");
            }
        }
        assert_eq!(avatar_video_filename(45, "female"), "female-middle.mp4");
        assert!(!is_allowed_avatar_video("../users.csv"));
    }
}
