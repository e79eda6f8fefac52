use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use setup_steamcmd::*;

const BANNER: &str = "Steam Console Client (c) Valve Corporation - version 1738362234\n";

/// Serves a prepared archive instead of hitting the network.
struct FixtureDownloader {
    archive: Option<PathBuf>,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FixtureDownloader {
    fn serving(archive: PathBuf) -> Self {
        FixtureDownloader { archive: Some(archive), calls: Mutex::new(vec![]) }
    }

    fn failing() -> Self {
        FixtureDownloader { archive: None, calls: Mutex::new(vec![]) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Downloader for FixtureDownloader {
    fn download(&self, url: &str, dest: &Path) -> io::Result<PathBuf> {
        self.calls.lock().unwrap().push((url.to_string(), dest.to_path_buf()));
        match &self.archive {
            Some(archive) => {
                std::fs::copy(archive, dest)?;
                Ok(dest.to_path_buf())
            }
            None => Err(io::Error::other("connection refused")),
        }
    }
}

#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
}

impl ArchiveExtractor for CountingExtractor {
    fn extract_zip(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ArchiveUnpacker.extract_zip(archive, dest)
    }

    fn extract_tar(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ArchiveUnpacker.extract_tar(archive, dest)
    }
}

/// Reports success without creating anything.
struct NoDirExtractor;

impl ArchiveExtractor for NoDirExtractor {
    fn extract_zip(&self, _: &Path, dest: &Path) -> io::Result<PathBuf> {
        Ok(dest.join("missing"))
    }

    fn extract_tar(&self, _: &Path, dest: &Path) -> io::Result<PathBuf> {
        Ok(dest.join("missing"))
    }
}

/// Answers every run with fixed stdout.
struct BannerRunner {
    stdout: String,
    calls: Mutex<Vec<PathBuf>>,
}

impl BannerRunner {
    fn new(stdout: &str) -> Self {
        BannerRunner { stdout: stdout.to_string(), calls: Mutex::new(vec![]) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ProcessRunner for BannerRunner {
    fn exec(&self, program: &Path, _: &[&str], _: ExecOptions) -> io::Result<ExecOutput> {
        self.calls.lock().unwrap().push(program.to_path_buf());
        Ok(ExecOutput { code: 0, stdout: self.stdout.clone() })
    }
}

fn tarball(path: &Path, files: &[(&str, &str)]) -> PathBuf {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    path.to_path_buf()
}

fn zipfile(path: &Path, files: &[(&str, &str)]) -> PathBuf {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in files {
        writer.start_file(*name, zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path.to_path_buf()
}

struct Fixture {
    temp: TempDir,
    cache: DirToolCache,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let cache = DirToolCache::with_arch(temp.path().join("toolcache"), "x64");
        std::fs::create_dir_all(temp.path().join("runner-temp")).unwrap();
        Fixture { temp, cache }
    }

    fn config(&self, platform: Platform) -> ProvisionConfig {
        let mut config = ProvisionConfig::new(platform, self.temp.path().join("runner-temp"));
        config.data_home = Some(self.temp.path().join("Steam"));
        config
    }

    fn linux_archive(&self) -> PathBuf {
        tarball(
            &self.temp.path().join("fixture_linux.tar.gz"),
            &[("steamcmd.sh", "#!/bin/sh\n"), ("linux32/steamcmd", "elf")],
        )
    }

    fn seed(&self, version: &str, entry: &str) -> PathBuf {
        let src = self.temp.path().join(format!("seed-{version}"));
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join(entry), "").unwrap();
        let version = ToolVersion::parse(version).unwrap();
        self.cache.cache_dir(&src, STEAMCMD, &version).unwrap()
    }
}

#[test]
fn test_cache_hit_skips_download_extract_and_probe() {
    let fixture = Fixture::new();
    let cached = fixture.seed("3.0.0", "steamcmd.sh");
    let downloader = FixtureDownloader::failing();
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let locations = provisioner.provision(&fixture.config(Platform::Linux)).unwrap();

    assert_eq!(locations.tool_directory, cached);
    assert_eq!(locations.version.to_string(), "3.0.0");
    assert_eq!(downloader.call_count(), 0);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_cold_start_caches_under_probed_version() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let locations = provisioner.provision(&fixture.config(Platform::Linux)).unwrap();

    let expected = ToolVersion::parse("1738362234.0.0").unwrap();
    assert_eq!(locations.version, expected);
    assert_eq!(fixture.cache.find_all_versions(STEAMCMD).unwrap(), vec![expected.clone()]);
    assert_eq!(
        locations.tool_directory,
        fixture.temp.path().join("toolcache/steamcmd/1738362234.0.0/x64")
    );
    // The probe runs against the suffixed entry point in the fresh extraction.
    let probed = runner.calls.lock().unwrap()[0].clone();
    assert_eq!(probed, fixture.temp.path().join("runner-temp/steamcmd/steamcmd.sh"));
}

#[test]
fn test_linux_cold_start_scenario() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new("Steam Console Client (c) Valve Corporation - version 5\n");

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let config = fixture.config(Platform::Linux);
    let locations = provisioner.provision(&config).unwrap();

    let (url, dest) = downloader.calls.lock().unwrap()[0].clone();
    assert!(url.ends_with("/steamcmd_linux.tar.gz"));
    assert_eq!(dest, config.temp_dir.join("steamcmd_linux.tar.gz"));
    assert_eq!(locations.version.to_string(), "5.0.0");
    assert!(locations.tool_directory.ends_with("steamcmd/5.0.0/x64"));
    assert!(locations.tool_directory.join("steamcmd.sh").is_file());
    assert!(locations.tool_directory.join("steamcmd").is_file());
    assert_eq!(locations.steam_root_directory, fixture.temp.path().join("Steam"));
    assert!(locations.steam_root_directory.is_dir());
    assert_eq!(locations.scratch_directory, config.temp_dir.join(".steamworks"));
    assert!(locations.scratch_directory.is_dir());
}

#[cfg(unix)]
#[test]
fn test_linux_cold_start_probes_real_binary() {
    let fixture = Fixture::new();
    let archive = tarball(
        &fixture.temp.path().join("fixture_linux.tar.gz"),
        &[(
            "steamcmd.sh",
            "#!/bin/sh\necho 'Steam Console Client (c) Valve Corporation - version 42'\n",
        )],
    );
    let downloader = FixtureDownloader::serving(archive);
    let extractor = ArchiveUnpacker;
    let runner = CommandRunner;

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let locations = provisioner.provision(&fixture.config(Platform::Linux)).unwrap();

    assert_eq!(locations.version.to_string(), "42.0.0");
    let shim = locations.tool_directory.join("steamcmd");
    let script = std::fs::read_to_string(&shim).unwrap();
    assert!(script.starts_with("#!/bin/bash\nexec "));
    assert!(script.contains("steamcmd.sh"));
}

#[test]
fn test_macos_cold_start_has_no_shim() {
    let fixture = Fixture::new();
    let archive = tarball(&fixture.temp.path().join("fixture_osx.tar.gz"), &[("steamcmd.sh", "#!/bin/sh\n")]);
    let downloader = FixtureDownloader::serving(archive);
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let locations = provisioner.provision(&fixture.config(Platform::MacOs)).unwrap();

    let (url, _) = downloader.calls.lock().unwrap()[0].clone();
    assert!(url.ends_with("/steamcmd_osx.tar.gz"));
    assert!(locations.tool_directory.join("steamcmd.sh").is_file());
    assert!(!locations.tool_directory.join("steamcmd").exists());
}

#[test]
fn test_windows_cold_start_uses_zip_and_tool_dir_as_data_home() {
    let fixture = Fixture::new();
    let archive = zipfile(&fixture.temp.path().join("fixture.zip"), &[("steamcmd.exe", "MZ")]);
    let downloader = FixtureDownloader::serving(archive);
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let mut config = fixture.config(Platform::Windows);
    config.data_home = None;
    let locations = provisioner.provision(&config).unwrap();

    let (url, dest) = downloader.calls.lock().unwrap()[0].clone();
    assert!(url.ends_with("/steamcmd.zip"));
    assert!(dest.ends_with("steamcmd.zip"));
    assert!(locations.tool_directory.join("steamcmd.exe").is_file());
    assert_eq!(locations.steam_root_directory, locations.tool_directory);
}

#[test]
fn test_unsupported_platform_fails_before_download() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let err = provisioner.provision(&fixture.config(Platform::Other)).unwrap_err();

    assert!(matches!(err, ProvisionError::UnsupportedPlatform { .. }));
    assert_eq!(downloader.call_count(), 0);
}

#[test]
fn test_second_run_reuses_cache() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);
    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let config = fixture.config(Platform::Linux);

    let first = provisioner.provision(&config).unwrap();
    let second = provisioner.provision(&config).unwrap();

    assert_eq!(first.tool_directory, second.tool_directory);
    assert_eq!(downloader.call_count(), 1);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn test_latest_cached_version_is_numeric_maximum() {
    let fixture = Fixture::new();
    fixture.seed("9.0.0", "steamcmd.sh");
    let ten = fixture.seed("10.0.0", "steamcmd.sh");
    let downloader = FixtureDownloader::failing();
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let locations = provisioner.provision(&fixture.config(Platform::Linux)).unwrap();

    assert_eq!(locations.version.to_string(), "10.0.0");
    assert_eq!(locations.tool_directory, ten);
}

#[test]
fn test_failed_probe_leaves_cache_empty() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new("Illegal instruction\n");

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let config = fixture.config(Platform::Linux);
    let err = provisioner.provision(&config).unwrap_err();

    assert!(matches!(err, ProvisionError::VersionProbeFailed { .. }));
    assert!(fixture.cache.find_all_versions(STEAMCMD).unwrap().is_empty());
    // The extraction is not cleaned up.
    assert!(config.temp_dir.join("steamcmd").join("steamcmd.sh").exists());
}

#[test]
fn test_failed_download_is_fatal() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::failing();
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let err = provisioner.provision(&fixture.config(Platform::Linux)).unwrap_err();

    assert!(matches!(err, ProvisionError::DownloadFailed { .. }));
    assert_eq!(downloader.call_count(), 1);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_extraction_without_directory_is_fatal() {
    let fixture = Fixture::new();
    let downloader = FixtureDownloader::serving(fixture.linux_archive());
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &NoDirExtractor, &runner);
    let err = provisioner.provision(&fixture.config(Platform::Linux)).unwrap_err();

    assert!(matches!(err, ProvisionError::ExtractionFailed { .. }));
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_cached_entry_without_tool_is_a_filesystem_error() {
    let fixture = Fixture::new();
    fixture.seed("3.0.0", "README.txt");
    let downloader = FixtureDownloader::failing();
    let extractor = CountingExtractor::default();
    let runner = BannerRunner::new(BANNER);

    let provisioner = Provisioner::new(&fixture.cache, &downloader, &extractor, &runner);
    let err = provisioner.provision(&fixture.config(Platform::Linux)).unwrap_err();
    assert!(matches!(err, ProvisionError::Filesystem { .. }));
}
