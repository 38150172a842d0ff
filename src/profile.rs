use crate::catalog::Profile;
use thiserror::Error;

const MIN_USER_AGE: u32 = 18;
const MAX_USER_AGE: u32 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("age '{0}' is not a number")]
    InvalidAge(String),
    #[error("age {0} is outside 18-120")]
    AgeOutOfRange(u32),
    #[error("pick at least one sport")]
    NoSports,
}

/// The signed-in user shown on the profile screen.
pub fn default_current_user() -> Profile {
    Profile {
        id: "current-user".to_owned(),
        name: "Tomás Fernández".to_owned(),
        age: 26,
        location: "Belgrano, CABA".to_owned(),
        bio: "Estudiante de educación física. Me gusta entrenar en el gimnasio y jugar al tenis. \
              Busco compañeros para actividades al aire libre."
            .to_owned(),
        sports: vec![
            "Tenis".to_owned(),
            "Gimnasio".to_owned(),
            "Natación".to_owned(),
        ],
        distance: 0.0,
        profile_picture: "/images/profile2.png".to_owned(),
    }
}

/// Editable copy of a profile, holding the age as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    base: Profile,
    pub name: String,
    pub age: String,
    pub location: String,
    pub bio: String,
    sports: Vec<String>,
}

impl ProfileDraft {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            base: profile.clone(),
            name: profile.name.clone(),
            age: profile.age.to_string(),
            location: profile.location.clone(),
            bio: profile.bio.clone(),
            sports: profile.sports.clone(),
        }
    }

    pub fn sports(&self) -> &[String] {
        &self.sports
    }

    pub fn set_sports(&mut self, sports: Vec<String>) {
        self.sports = sports;
    }

    pub fn toggle_sport(&mut self, sport: &str) -> bool {
        if let Some(position) = self.sports.iter().position(|selected| selected == sport) {
            self.sports.remove(position);
            false
        } else {
            self.sports.push(sport.to_owned());
            true
        }
    }

    pub fn validate(&self) -> Result<Profile, ProfileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let age_text = self.age.trim();
        let age: u32 = age_text
            .parse()
            .map_err(|_| ProfileError::InvalidAge(age_text.to_owned()))?;
        if !(MIN_USER_AGE..=MAX_USER_AGE).contains(&age) {
            return Err(ProfileError::AgeOutOfRange(age));
        }

        if self.sports.is_empty() {
            return Err(ProfileError::NoSports);
        }

        Ok(Profile {
            name: name.to_owned(),
            age,
            location: self.location.trim().to_owned(),
            bio: self.bio.trim().to_owned(),
            sports: self.sports.clone(),
            ..self.base.clone()
        })
    }
}
