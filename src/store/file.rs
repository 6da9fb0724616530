//! File-backed [`TokenStore`] shared by every process on the host.
//!
//! The file is a JSON object with two string keys, `ctime` (fractional unix seconds at which
//! the token was obtained) and `token`. Writers replace it atomically via a per-process
//! temporary sibling and keep it readable by the owner only. Concurrent writers race and the
//! last rename wins; any unexpired token is as good as another.

// std
use std::{
	ffi::OsString,
	fs::{self, OpenOptions},
	io::{ErrorKind, Write},
	process,
};
// self
use crate::{
	_prelude::*,
	store::{CachedToken, StoreError, TokenStore},
	token::TokenSecret,
};

#[cfg(unix)] const CACHE_FILE_MODE: u32 = 0o600;

/// Persists the session token to a JSON file after each successful fetch.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
	path: PathBuf,
}
impl FileTokenStore {
	/// Points the store at `path`. Nothing is touched on disk until the first load or save.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Location of the cache file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn ensure_parent_exists(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn parse(&self, raw: &str) -> Result<CachedToken, StoreError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let file: CacheFile =
			serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", self.path.display()),
			})?;
		let created_at = file.ctime.to_datetime()?;

		Ok(CachedToken { secret: TokenSecret::new(file.token), created_at })
	}

	// Sibling of the cache file, unique to this process.
	fn tmp_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();

		name.push(format!(".{}.tmp", process::id()));

		self.path.with_file_name(name)
	}

	fn write_replacing(&self, tmp_path: &Path, payload: &[u8]) -> Result<(), StoreError> {
		let mut file = self.open_tmp(tmp_path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", tmp_path.display()),
		})?;

		file.write_all(payload).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", tmp_path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", tmp_path.display()),
		})?;

		drop(file);

		fs::rename(tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn open_tmp(&self, tmp_path: &Path) -> std::io::Result<fs::File> {
		let mut options = OpenOptions::new();

		options.write(true).create(true).truncate(true);

		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;

			options.mode(CACHE_FILE_MODE);
		}

		options.open(tmp_path)
	}

	fn restrict_permissions(&self) -> Result<(), StoreError> {
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;

			fs::set_permissions(&self.path, fs::Permissions::from_mode(CACHE_FILE_MODE)).map_err(
				|e| StoreError::Backend {
					message: format!("Failed to restrict {}: {e}", self.path.display()),
				},
			)?;
		}

		Ok(())
	}
}
impl TokenStore for FileTokenStore {
	fn load(&self) -> Result<Option<CachedToken>, StoreError> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		self.parse(&raw).map(Some)
	}

	fn save(&self, token: &CachedToken) -> Result<(), StoreError> {
		self.ensure_parent_exists()?;

		let payload = CacheFileRef {
			ctime: format_ctime(token.created_at),
			token: token.secret.expose(),
		};
		let serialized = serde_json::to_vec(&payload).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize token cache: {e}"),
		})?;
		let tmp_path = self.tmp_path();

		if let Err(e) = self.write_replacing(&tmp_path, &serialized) {
			let _ = fs::remove_file(&tmp_path);

			return Err(e);
		}

		self.restrict_permissions()
	}
}

#[derive(Deserialize)]
struct CacheFile {
	ctime: CacheTime,
	token: String,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
	ctime: String,
	token: &'a str,
}

// Older writers may have stored a bare JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheTime {
	Text(String),
	Number(f64),
}
impl CacheTime {
	fn to_datetime(&self) -> Result<OffsetDateTime, StoreError> {
		let invalid = || StoreError::InvalidTimestamp {
			value: match self {
				CacheTime::Text(text) => text.clone(),
				CacheTime::Number(n) => n.to_string(),
			},
		};
		let seconds = match self {
			CacheTime::Text(text) => text.trim().parse::<f64>().map_err(|_| invalid())?,
			CacheTime::Number(n) => *n,
		};

		if !seconds.is_finite() {
			return Err(invalid());
		}

		OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9) as i128).map_err(|_| invalid())
	}
}

fn format_ctime(instant: OffsetDateTime) -> String {
	let seconds = instant.unix_timestamp_nanos() as f64 / 1e9;

	seconds.to_string()
}
