//! Signed-in session kept between runs, and small view state such as the
//! selected batch.

use std::{fs, io, path::Path};

use engine::RestSession;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::Result;

fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFile {
    pub session: Option<RestSession>,
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self> {
        load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save(path, self)
    }

    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub selected_batch: Option<Uuid>,
}

impl ViewState {
    pub fn load(path: &Path) -> Result<Self> {
        load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save(path, self)
    }
}

#[cfg(test)]
mod tests {
    use engine::User;

    use super::*;

    #[test]
    fn session_round_trips_and_clears() {
        let path = Path::new("target/test_state/session.json");
        let file = SessionFile {
            session: Some(RestSession {
                user: User::new("u-1", "asha@example.com", ""),
                access_token: "token".to_string(),
            }),
        };

        file.save(path).unwrap();
        assert_eq!(SessionFile::load(path).unwrap().session, file.session);

        SessionFile::clear(path).unwrap();
        assert!(SessionFile::load(path).unwrap().session.is_none());
        SessionFile::clear(path).unwrap();
    }

    #[test]
    fn missing_view_state_is_empty() {
        let state = ViewState::load(Path::new("target/test_state/no_state.json")).unwrap();
        assert!(state.selected_batch.is_none());
    }
}
