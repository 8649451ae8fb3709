//! Avatar selection for new students.
//!
//! An [`AvatarPool`] maps each [`Gender`] to a list of image references and
//! is built once at startup, either from a numbered remote catalog or from a
//! scan of a local directory. Selection is uniform over the gender's list and
//! takes the random source as a parameter so tests can seed it.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::{AvatarConfig, AvatarSource};
use crate::error::Result;
use crate::student::Gender;

/// File extensions accepted by the local directory scan (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Gender-keyed avatar catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarPool {
    images: BTreeMap<Gender, Vec<String>>,
    placeholders: BTreeMap<Gender, String>,
    fallback: String,
}

impl AvatarPool {
    /// An empty pool that always answers with `fallback`.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            images: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Replace the image list for `gender`.
    #[must_use]
    pub fn with_images(mut self, gender: Gender, images: Vec<String>) -> Self {
        self.images.insert(gender, images);
        self
    }

    /// Set the reference used when `gender` has no images.
    #[must_use]
    pub fn with_placeholder(mut self, gender: Gender, placeholder: impl Into<String>) -> Self {
        self.placeholders.insert(gender, placeholder.into());
        self
    }

    /// Build the numbered remote catalog: `{base_url}/{Gender}/{n}.png?raw=true`.
    #[must_use]
    pub fn remote(base_url: &str, male_count: u32, female_count: u32, fallback: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let numbered = |gender: Gender, count: u32| -> Vec<String> {
            (1..=count)
                .map(|n| format!("{base_url}/{gender}/{n}.png?raw=true"))
                .collect()
        };

        Self::new(fallback)
            .with_images(Gender::Male, numbered(Gender::Male, male_count))
            .with_images(Gender::Female, numbered(Gender::Female, female_count))
    }

    /// Scan `{dir}/{Gender}/` for image files.
    ///
    /// Found files are exposed as `{url_prefix}/{Gender}/{file}`. A gender
    /// whose directory is missing or holds no images gets the placeholder
    /// `{url_prefix}/default_{gender}.png`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory exists but cannot be read.
    pub fn scan_local(dir: &Path, url_prefix: &str, fallback: &str) -> Result<Self> {
        let url_prefix = url_prefix.trim_end_matches('/');
        let mut pool = Self::new(fallback);

        for gender in Gender::ALL {
            let files = list_images(&dir.join(gender.as_str()))?;
            if files.is_empty() {
                warn!(
                    "No {} avatars under {}, using placeholder",
                    gender,
                    dir.display()
                );
            }
            let images = files
                .into_iter()
                .map(|file| format!("{url_prefix}/{gender}/{file}"))
                .collect();
            let placeholder = format!(
                "{url_prefix}/default_{}.png",
                gender.as_str().to_ascii_lowercase()
            );
            pool = pool
                .with_images(gender, images)
                .with_placeholder(gender, placeholder);
        }

        Ok(pool)
    }

    /// Build the pool described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a local avatar directory cannot be read.
    pub fn from_config(config: &AvatarConfig) -> Result<Self> {
        let pool = match config.source {
            AvatarSource::Remote => Self::remote(
                &config.remote_base_url,
                config.male_count,
                config.female_count,
                &config.fallback,
            ),
            AvatarSource::Local => {
                Self::scan_local(&config.local_dir, &config.url_prefix, &config.fallback)?
            }
        };
        debug!(
            "Avatar pool ready: {} male, {} female",
            pool.images(Gender::Male).len(),
            pool.images(Gender::Female).len()
        );
        Ok(pool)
    }

    /// The images available for `gender`.
    #[must_use]
    pub fn images(&self, gender: Gender) -> &[String] {
        self.images.get(&gender).map(Vec::as_slice).unwrap_or_default()
    }

    /// The process-wide fallback reference.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Whether `avatar` is a reference `assign` could return for `gender`.
    #[must_use]
    pub fn allows(&self, gender: Gender, avatar: &str) -> bool {
        let images = self.images(gender);
        if !images.is_empty() {
            return images.iter().any(|image| image == avatar);
        }
        match self.placeholders.get(&gender) {
            Some(placeholder) => placeholder == avatar,
            None => self.fallback == avatar,
        }
    }

    /// Pick an avatar for `gender` uniformly at random.
    ///
    /// Falls back to the gender's placeholder when its list is empty, and to
    /// the process-wide fallback when it has no placeholder either.
    pub fn assign<R: Rng + ?Sized>(&self, gender: Gender, rng: &mut R) -> String {
        if let Some(image) = self.images(gender).choose(rng) {
            return image.clone();
        }
        self.placeholders
            .get(&gender)
            .unwrap_or(&self.fallback)
            .clone()
    }
}

/// Image file names directly inside `dir`, sorted. Missing directory is empty.
fn list_images(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push(name),
            Err(name) => warn!("Skipping avatar with non UTF-8 name: {:?}", name),
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;

    const FALLBACK: &str = "https://example.com/default.png";

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_remote_catalog_sizes() {
        let pool = AvatarPool::remote("https://host/icons/", 49, 30, FALLBACK);

        assert_eq!(pool.images(Gender::Male).len(), 49);
        assert_eq!(pool.images(Gender::Female).len(), 30);
        assert_eq!(
            pool.images(Gender::Male)[0],
            "https://host/icons/Male/1.png?raw=true"
        );
        assert_eq!(
            pool.images(Gender::Female)[29],
            "https://host/icons/Female/30.png?raw=true"
        );
    }

    #[test]
    fn test_assign_stays_in_gender_pool() {
        let pool = AvatarPool::remote("https://host", 49, 30, FALLBACK);
        let mut rng = seeded();

        for _ in 0..200 {
            let male = pool.assign(Gender::Male, &mut rng);
            assert!(male.contains("/Male/"), "{male}");
            assert!(pool.allows(Gender::Male, &male));
            assert!(!pool.allows(Gender::Female, &male));

            let female = pool.assign(Gender::Female, &mut rng);
            assert!(female.contains("/Female/"), "{female}");
            assert!(pool.allows(Gender::Female, &female));
        }
    }

    #[test]
    fn test_assign_is_deterministic_for_a_seed() {
        let pool = AvatarPool::remote("https://host", 49, 30, FALLBACK);

        let first: Vec<String> = {
            let mut rng = seeded();
            (0..10).map(|_| pool.assign(Gender::Male, &mut rng)).collect()
        };
        let second: Vec<String> = {
            let mut rng = seeded();
            (0..10).map(|_| pool.assign(Gender::Male, &mut rng)).collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_assign_covers_whole_pool() {
        let pool = AvatarPool::new(FALLBACK).with_images(
            Gender::Female,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );
        let mut rng = seeded();

        let mut seen: Vec<String> = (0..300)
            .map(|_| pool.assign(Gender::Female, &mut rng))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_pool_uses_fallback() {
        let pool = AvatarPool::remote("https://host", 0, 0, FALLBACK);
        let mut rng = seeded();

        assert_eq!(pool.assign(Gender::Male, &mut rng), FALLBACK);
        assert!(pool.allows(Gender::Male, FALLBACK));
        assert_eq!(pool.fallback(), FALLBACK);
    }

    #[test]
    fn test_placeholder_preferred_over_fallback() {
        let pool = AvatarPool::new(FALLBACK).with_placeholder(Gender::Female, "f.png");
        let mut rng = seeded();

        assert_eq!(pool.assign(Gender::Female, &mut rng), "f.png");
        assert_eq!(pool.assign(Gender::Male, &mut rng), FALLBACK);
        assert!(!pool.allows(Gender::Female, FALLBACK));
    }

    #[test]
    fn test_scan_local_filters_extensions() {
        let dir = TempDir::new().unwrap();
        let male = dir.path().join("Male");
        std::fs::create_dir_all(&male).unwrap();
        for name in ["2.PNG", "1.jpg", "notes.txt", "3.webp"] {
            std::fs::write(male.join(name), b"x").unwrap();
        }
        std::fs::create_dir_all(male.join("nested.png")).unwrap();

        let pool = AvatarPool::scan_local(dir.path(), "/static/profile_icons/", FALLBACK).unwrap();

        assert_eq!(
            pool.images(Gender::Male),
            [
                "/static/profile_icons/Male/1.jpg",
                "/static/profile_icons/Male/2.PNG",
                "/static/profile_icons/Male/3.webp",
            ]
        );
    }

    #[test]
    fn test_scan_local_missing_dir_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Female")).unwrap();

        let pool = AvatarPool::scan_local(dir.path(), "/icons", FALLBACK).unwrap();
        let mut rng = seeded();

        assert!(pool.images(Gender::Male).is_empty());
        assert_eq!(pool.assign(Gender::Male, &mut rng), "/icons/default_male.png");
        assert_eq!(
            pool.assign(Gender::Female, &mut rng),
            "/icons/default_female.png"
        );
    }

    #[test]
    fn test_from_config_remote_default() {
        let config = AvatarConfig::default();
        let pool = AvatarPool::from_config(&config).unwrap();

        assert_eq!(pool.images(Gender::Male).len(), 49);
        assert_eq!(pool.images(Gender::Female).len(), 30);
    }

    #[test]
    fn test_from_config_local() {
        let dir = TempDir::new().unwrap();
        let female = dir.path().join("Female");
        std::fs::create_dir_all(&female).unwrap();
        std::fs::write(female.join("1.png"), b"x").unwrap();

        let config = AvatarConfig {
            source: AvatarSource::Local,
            local_dir: dir.path().to_path_buf(),
            ..AvatarConfig::default()
        };
        let pool = AvatarPool::from_config(&config).unwrap();

        assert_eq!(pool.images(Gender::Female).len(), 1);
        assert!(pool.images(Gender::Male).is_empty());
    }
}
