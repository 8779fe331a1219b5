use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{
    cookie::Cookie,
    jar::{CookieJar, JarError, io_error, serialization_error},
};

const JAR_FORMAT_VERSION: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedJar {
    version: u64,
    cookies: Vec<Cookie>,
}

/// File-backed jar used by the runtime binary. Every mutation rewrites the
/// whole file through a temp-file-and-rename so a crash never leaves a
/// half-written jar behind.
#[derive(Debug)]
pub struct FileJar {
    path: PathBuf,
    // Serializes read-modify-write cycles between handles in this process.
    write_lock: Mutex<()>,
}

impl FileJar {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> Result<Vec<Cookie>, JarError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(io_error(format!(
                    "failed to read cookie jar '{}': {err}",
                    self.path.display()
                )));
            }
        };

        let parsed: PersistedJar = serde_json::from_str(&content).map_err(|err| {
            serialization_error(format!(
                "failed to parse cookie jar '{}': {err}",
                self.path.display()
            ))
        })?;
        if parsed.version != JAR_FORMAT_VERSION {
            return Err(serialization_error(format!(
                "unsupported cookie jar version {} at '{}'",
                parsed.version,
                self.path.display()
            )));
        }

        let now = OffsetDateTime::now_utc();
        Ok(parsed
            .cookies
            .into_iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .collect())
    }

    fn save(&self, cookies: Vec<Cookie>) -> Result<(), JarError> {
        let parent = self.path.parent().ok_or_else(|| {
            io_error(format!(
                "cookie jar path '{}' has no parent",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|err| {
            io_error(format!(
                "failed to create cookie jar directory '{}': {err}",
                parent.display()
            ))
        })?;

        let persisted = PersistedJar {
            version: JAR_FORMAT_VERSION,
            cookies,
        };

        let tmp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&tmp_path).map_err(|err| {
            io_error(format!(
                "failed to create cookie jar temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
        {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &persisted).map_err(|err| {
                serialization_error(format!(
                    "failed to serialize cookie jar '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer.write_all(b"\n").map_err(|err| {
                io_error(format!(
                    "failed to finalize cookie jar '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer.flush().map_err(|err| {
                io_error(format!(
                    "failed to flush cookie jar '{}': {err}",
                    tmp_path.display()
                ))
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            io_error(format!(
                "failed to replace cookie jar '{}' from '{}': {err}",
                self.path.display(),
                tmp_path.display()
            ))
        })
    }

    fn mutate(
        &self,
        apply: impl FnOnce(&mut Vec<Cookie>),
    ) -> Result<Vec<Cookie>, JarError> {
        let guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut cookies = self.load()?;
        apply(&mut cookies);
        self.save(cookies.clone())?;
        drop(guard);
        Ok(cookies)
    }
}

impl CookieJar for FileJar {
    fn list(&self) -> Result<Vec<Cookie>, JarError> {
        self.load()
    }

    fn get(&self, name: &str) -> Result<Option<Cookie>, JarError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|cookie| cookie.name == name))
    }

    fn set(&self, cookie: Cookie) -> Result<(), JarError> {
        let now = OffsetDateTime::now_utc();
        self.mutate(|cookies| {
            cookies.retain(|existing| {
                (existing.name != cookie.name
                    || existing.domain != cookie.domain
                    || existing.path != cookie.path)
                    && !existing.is_expired_at(now)
            });
            if !cookie.is_expired_at(now) {
                cookies.push(cookie);
            }
        })
        .map(|_| ())
    }

    fn remove(&self, name: &str, domain: Option<&str>, path: &str) -> Result<bool, JarError> {
        let mut removed = false;
        self.mutate(|cookies| {
            let before = cookies.len();
            cookies.retain(|cookie| {
                cookie.name != name
                    || cookie.domain.as_deref() != domain
                    || cookie.path != path
            });
            removed = cookies.len() != before;
        })?;
        Ok(removed)
    }
}
