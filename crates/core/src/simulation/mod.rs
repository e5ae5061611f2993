//! Simulation module - the patient profile a practice session starts from and
//! the avatar video shown for it.

mod avatar;
mod patient_model;

pub use avatar::{
    avatar_video_filename, is_allowed_avatar_video, AgeGroup, AvatarGender,
    ALLOWED_AVATAR_VIDEOS, DEFAULT_AVATAR_VIDEO,
};
pub use patient_model::PatientProfile;
