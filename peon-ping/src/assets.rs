//! Hook scripts, sound packs and the toggle skill.
//!
//! Assets come either from a local checkout of the peon-ping repository or
//! from the upstream repository over HTTP. Individual download failures are
//! collected as warnings; only local filesystem errors abort the install.

use anyhow::{Context, Result};
use peon_common::{CORE_FILES, InstallLayout, PACKS, Platform, SKILL_NAME, atomic_write};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "peon-ping-installer";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const SOUND_EXTENSIONS: [&str; 3] = ["wav", "mp3", "ogg"];

/// Retrieves a file by URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetch`] over HTTPS with a blocking `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("GET {}", url))?;
        response
            .body_mut()
            .read_to_vec()
            .with_context(|| format!("reading body of {}", url))
    }
}

/// Where assets are taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// A checkout containing `peon.sh`.
    Local(PathBuf),
    /// Base URL that mirrors the repository layout.
    Remote(String),
}

impl AssetSource {
    /// Pick the source: an explicit checkout, else the directory holding the
    /// running executable if it looks like a checkout, else `repo_base`.
    pub fn resolve(explicit: Option<&Path>, repo_base: &str) -> Result<Self> {
        if let Some(dir) = explicit {
            if !is_checkout(dir) {
                anyhow::bail!("{} does not contain peon.sh", dir.display());
            }
            return Ok(AssetSource::Local(dir.to_path_buf()));
        }

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
            && is_checkout(dir)
        {
            debug!("Running from a checkout at {:?}", dir);
            return Ok(AssetSource::Local(dir.to_path_buf()));
        }

        Ok(AssetSource::Remote(repo_base.to_string()))
    }

    pub fn describe(&self) -> String {
        match self {
            AssetSource::Local(dir) => format!("local checkout {}", dir.display()),
            AssetSource::Remote(base) => base.clone(),
        }
    }
}

fn is_checkout(dir: &Path) -> bool {
    dir.join("peon.sh").is_file()
}

/// What an asset pass installed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub core_files: Vec<String>,
    pub config_installed: bool,
    pub skill_installed: bool,
    pub warnings: Vec<String>,
}

impl AssetReport {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// `manifest.json` of a sound pack. Only the sound file names matter here.
#[derive(Debug, Deserialize)]
struct PackManifest {
    #[serde(default)]
    categories: BTreeMap<String, ManifestCategory>,
}

#[derive(Debug, Deserialize)]
struct ManifestCategory {
    #[serde(default)]
    sounds: Vec<ManifestSound>,
}

#[derive(Debug, Deserialize)]
struct ManifestSound {
    file: String,
}

/// Distinct sound file names referenced by a manifest, in first-seen order.
fn manifest_sound_files(manifest: &[u8]) -> Result<Vec<String>> {
    let manifest: PackManifest =
        serde_json::from_slice(manifest).context("invalid pack manifest")?;
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for category in manifest.categories.values() {
        for sound in &category.sounds {
            if seen.insert(sound.file.as_str()) {
                files.push(sound.file.clone());
            }
        }
    }
    Ok(files)
}

/// A bare file name that cannot escape the directory it is joined onto.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// Create `packs/<pack>/sounds` for every bundled pack.
pub fn create_pack_dirs(layout: &InstallLayout) -> Result<()> {
    for pack in PACKS {
        let dir = layout.sounds_dir(pack);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

/// Install hook scripts, packs and (on a fresh install) the default config.
pub fn install_assets(
    layout: &InstallLayout,
    source: &AssetSource,
    fetcher: &dyn Fetch,
    updating: bool,
) -> Result<AssetReport> {
    create_pack_dirs(layout)?;
    let mut report = AssetReport::default();

    match source {
        AssetSource::Local(dir) => copy_from_checkout(layout, dir, updating, &mut report)?,
        AssetSource::Remote(base) => {
            download_from_repo(layout, base, fetcher, updating, &mut report)?
        }
    }

    info!(
        "Installed {} core files from {}",
        report.core_files.len(),
        source.describe()
    );
    Ok(report)
}

fn copy_from_checkout(
    layout: &InstallLayout,
    checkout: &Path,
    updating: bool,
    report: &mut AssetReport,
) -> Result<()> {
    let src_packs = checkout.join("packs");
    for pack in PACKS {
        let src_pack = src_packs.join(pack);
        if !src_pack.is_dir() {
            continue;
        }
        let dst_pack = layout.pack_dir(pack);
        for entry in fs::read_dir(&src_pack)
            .with_context(|| format!("reading {}", src_pack.display()))?
        {
            let entry = entry?;
            let dst = dst_pack.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                if dst.exists() {
                    fs::remove_dir_all(&dst)
                        .with_context(|| format!("removing {}", dst.display()))?;
                }
                copy_dir_all(&entry.path(), &dst)?;
            } else {
                fs::copy(entry.path(), &dst)
                    .with_context(|| format!("copying to {}", dst.display()))?;
            }
        }
        debug!("Copied pack {}", pack);
    }

    let install_dir = layout.install_dir();
    for name in CORE_FILES {
        let src = checkout.join(name);
        if src.is_file() {
            fs::copy(&src, install_dir.join(name))
                .with_context(|| format!("copying {}", name))?;
            report.core_files.push(name.to_string());
        }
    }

    if !updating {
        let src_config = checkout.join("config.json");
        if src_config.is_file() {
            fs::copy(&src_config, layout.config_file()).context("copying config.json")?;
            report.config_installed = true;
        }
    }
    Ok(())
}

fn download_from_repo(
    layout: &InstallLayout,
    base: &str,
    fetcher: &dyn Fetch,
    updating: bool,
    report: &mut AssetReport,
) -> Result<()> {
    let install_dir = layout.install_dir();
    for name in CORE_FILES {
        match download(fetcher, &format!("{}/{}", base, name), &install_dir.join(name)) {
            Ok(()) => report.core_files.push(name.to_string()),
            Err(e) => report.warn(format!("could not download {}: {:#}", name, e)),
        }
    }

    for pack in PACKS {
        let manifest_path = layout.pack_dir(pack).join("manifest.json");
        let manifest_url = format!("{}/packs/{}/manifest.json", base, pack);
        let manifest = match fetcher.fetch(&manifest_url) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.warn(format!("could not download {}/manifest.json: {:#}", pack, e));
                continue;
            }
        };
        atomic_write(&manifest_path, &manifest)
            .with_context(|| format!("writing {}", manifest_path.display()))?;

        let files = match manifest_sound_files(&manifest) {
            Ok(files) => files,
            Err(e) => {
                report.warn(format!("{}: {:#}", pack, e));
                continue;
            }
        };
        let sounds_dir = layout.sounds_dir(pack);
        for file in files {
            if !is_plain_file_name(&file) {
                report.warn(format!("{}: skipping sound with unsafe name '{}'", pack, file));
                continue;
            }
            let url = format!("{}/packs/{}/sounds/{}", base, pack, file);
            if let Err(e) = download(fetcher, &url, &sounds_dir.join(&file)) {
                debug!("Skipping sound {}/{}: {:#}", pack, file, e);
            }
        }
    }

    if !updating {
        match download(fetcher, &format!("{}/config.json", base), &layout.config_file()) {
            Ok(()) => report.config_installed = true,
            Err(e) => debug!("No default config downloaded: {:#}", e),
        }
    }
    Ok(())
}

fn download(fetcher: &dyn Fetch, url: &str, dest: &Path) -> Result<()> {
    let bytes = fetcher.fetch(url)?;
    atomic_write(dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;
    debug!("Downloaded {} ({} bytes)", url, bytes.len());
    Ok(())
}

fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("creating {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("reading {}", src.display()))? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copying to {}", target.display()))?;
        }
    }
    Ok(())
}

/// Mark `peon.sh` executable. Windows runs the Python hook instead.
pub fn make_hook_executable(layout: &InstallLayout, platform: Platform) -> Result<()> {
    let script = layout.hook_script();
    if platform == Platform::Windows || !script.is_file() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod {}", script.display()))?;
        debug!("Marked {:?} executable", script);
    }
    Ok(())
}

/// Install `SKILL.md` for the toggle slash command.
pub fn install_skill(
    layout: &InstallLayout,
    source: &AssetSource,
    fetcher: &dyn Fetch,
    report: &mut AssetReport,
) -> Result<()> {
    let skill_dir = layout.skill_dir();
    fs::create_dir_all(&skill_dir).with_context(|| format!("creating {}", skill_dir.display()))?;
    let dest = skill_dir.join("SKILL.md");

    match source {
        AssetSource::Local(dir) => {
            let src = dir.join("skills").join(SKILL_NAME).join("SKILL.md");
            if src.is_file() {
                fs::copy(&src, &dest).context("copying SKILL.md")?;
                report.skill_installed = true;
            }
        }
        AssetSource::Remote(base) => {
            let url = format!("{}/skills/{}/SKILL.md", base, SKILL_NAME);
            match download(fetcher, &url, &dest) {
                Ok(()) => report.skill_installed = true,
                Err(e) => report.warn(format!("could not download SKILL.md: {:#}", e)),
            }
        }
    }
    Ok(())
}

/// Number of playable sound files in `dir`.
pub fn count_sounds(dir: &Path) -> usize {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    SOUND_EXTENSIONS
        .iter()
        .filter_map(|ext| glob::glob(&format!("{}/*.{}", escaped, ext)).ok())
        .map(|paths| paths.filter_map(Result::ok).count())
        .sum()
}

/// Sound file count for every bundled pack.
pub fn pack_sound_counts(layout: &InstallLayout) -> Vec<(&'static str, usize)> {
    PACKS
        .iter()
        .map(|pack| (*pack, count_sounds(&layout.sounds_dir(pack))))
        .collect()
}
