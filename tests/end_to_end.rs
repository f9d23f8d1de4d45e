use galaxy_pixel_benchmark::core_modules::label_vector::LABEL_COUNT;
use galaxy_pixel_benchmark::core_modules::pixel::pixel::ChannelDepth;
use galaxy_pixel_benchmark::utils::image_helper::image_helper::IdentifierSource;
use galaxy_pixel_benchmark::{BenchmarkConfig, BenchmarkError, BenchmarkPipeline, RunSummary};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const WIDTH: u32 = 40;
const HEIGHT: u32 = 30;

/// A galaxy image whose central 10x10 patch is `center` and whose border is
/// a clashing color that must never leak into the sample.
fn galaxy(center: [u8; 3]) -> RgbaImage {
    let border = Rgba([255, 0, 0, 255]);
    let core = Rgba([center[0], center[1], center[2], 255]);
    ImageBuffer::from_fn(WIDTH, HEIGHT, |x, y| {
        if (15..25).contains(&x) && (10..20).contains(&y) {
            core
        } else {
            border
        }
    })
}

fn header() -> String {
    let mut fields = vec!["GalaxyID".to_string()];
    fields.extend((1..=LABEL_COUNT).map(|i| format!("Class{i}")));
    fields.join(",")
}

fn one_hot_row(identifier: &str, index: usize) -> String {
    let mut fields = vec![identifier.to_string()];
    fields.extend((0..LABEL_COUNT).map(|j| if j == index { "1" } else { "0" }.to_string()));
    fields.join(",")
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("images_training")).unwrap();
        fs::create_dir(dir.path().join("images_test")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn training(&self, identifier: &str, image: &RgbaImage) {
        image
            .save(self.path("images_training").join(format!("{identifier}.png")))
            .unwrap();
    }

    fn test(&self, identifier: &str, image: &RgbaImage) {
        image
            .save(self.path("images_test").join(format!("{identifier}.png")))
            .unwrap();
    }

    fn solutions(&self, rows: &[String]) {
        let mut text = header();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        fs::write(self.path("solutions_training.csv"), text).unwrap();
    }

    fn config(&self, depth: ChannelDepth) -> BenchmarkConfig {
        BenchmarkConfig {
            training_images: self.path("images_training"),
            test_images: self.path("images_test"),
            image_extension: "png".to_string(),
            solutions: self.path("solutions_training.csv"),
            output: self.path("lastrun.csv"),
            channel_depth: depth,
            workers: 2,
            ..BenchmarkConfig::default()
        }
    }

    fn output_lines(&self) -> Vec<String> {
        fs::read_to_string(self.path("lastrun.csv"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn zeros_after(identifier: &str, leading: &[&str]) -> String {
    let mut fields = vec![identifier.to_string()];
    fields.extend(leading.iter().map(|s| s.to_string()));
    fields.extend(std::iter::repeat_n("0".to_string(), LABEL_COUNT - leading.len()));
    fields.join(",")
}

async fn run(config: BenchmarkConfig) -> Result<RunSummary, BenchmarkError> {
    BenchmarkPipeline::new(config)?.run().await
}

#[tokio::test]
async fn shared_color_ratio_averages_answers_and_unseen_ratio_gets_zeros() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([120, 120, 120]));
    ws.training("100002", &galaxy([121, 120, 121]));
    ws.test("200001", &galaxy([90, 90, 90]));
    ws.test("200002", &galaxy([200, 0, 100]));
    ws.solutions(&[one_hot_row("100001", 0), one_hot_row("100002", 1)]);

    let summary = run(ws.config(ChannelDepth::Eight)).await.unwrap();
    assert_eq!(
        summary,
        RunSummary {
            training_images: 2,
            clusters: 1,
            test_images: 2,
            predictions: 2,
            misses: 1,
        }
    );

    let lines = ws.output_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], header());
    assert_eq!(lines[1], zeros_after("200001", &["0.5", "0.5"]));
    assert_eq!(lines[2], zeros_after("200002", &[]));
    assert!(!ws.path("lastrun.csv.partial").exists());
}

#[tokio::test]
async fn wide_channels_cluster_grey_galaxies_together() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([40, 40, 40]));
    ws.training("100002", &galaxy([200, 200, 200]));
    ws.training("100003", &galaxy([0, 0, 0]));
    ws.test("200001", &galaxy([128, 128, 128]));
    ws.test("200002", &galaxy([0, 0, 0]));
    ws.solutions(&[
        one_hot_row("100001", 2),
        one_hot_row("100002", 3),
        one_hot_row("100003", 36),
    ]);

    let summary = run(ws.config(ChannelDepth::Sixteen)).await.unwrap();
    assert_eq!(summary.clusters, 2);
    assert_eq!(summary.misses, 0);

    let lines = ws.output_lines();
    assert_eq!(lines[1], zeros_after("200001", &["0", "0", "0.5", "0.5"]));
    let black: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(black.len(), LABEL_COUNT + 1);
    assert_eq!(black[0], "200002");
    assert_eq!(black[LABEL_COUNT], "1");
}

#[tokio::test]
async fn every_test_image_gets_exactly_one_row() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([120, 120, 120]));
    ws.solutions(&[one_hot_row("100001", 0)]);
    for i in 0..12u8 {
        ws.test(&format!("2000{i:02}"), &galaxy([i * 20, 100, 60]));
    }

    let summary = run(ws.config(ChannelDepth::Eight)).await.unwrap();
    assert_eq!(summary.test_images, 12);
    assert_eq!(summary.predictions, 12);

    let lines = ws.output_lines();
    assert_eq!(lines.len(), 13);
    let mut ids: Vec<&str> = lines[1..].iter().map(|l| l.split(',').next().unwrap()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 12);
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), LABEL_COUNT + 1);
    }
}

#[tokio::test]
async fn training_image_without_solution_aborts_without_output() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([120, 120, 120]));
    ws.training("100002", &galaxy([10, 20, 30]));
    ws.test("200001", &galaxy([90, 90, 90]));
    ws.solutions(&[one_hot_row("100001", 0)]);

    let err = run(ws.config(ChannelDepth::Eight)).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::MissingLabels { ref identifier } if identifier == "100002"));
    assert!(!ws.path("lastrun.csv").exists());
}

#[tokio::test]
async fn empty_training_directory_aborts() {
    let ws = Workspace::new();
    ws.test("200001", &galaxy([90, 90, 90]));
    ws.solutions(&[]);

    let err = run(ws.config(ChannelDepth::Eight)).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::NoClusters));
}

#[tokio::test]
async fn image_smaller_than_the_patch_aborts() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([120, 120, 120]));
    ws.solutions(&[one_hot_row("100001", 0)]);
    let tiny: RgbaImage = ImageBuffer::from_pixel(6, 6, Rgba([50, 50, 50, 255]));
    ws.test("200001", &tiny);

    let err = run(ws.config(ChannelDepth::Eight)).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::PatchOutOfBounds { width: 6, height: 6, .. }));
}

#[tokio::test]
async fn malformed_solutions_abort_before_sampling() {
    let ws = Workspace::new();
    ws.training("100001", &galaxy([120, 120, 120]));
    fs::write(
        ws.path("solutions_training.csv"),
        format!("{}\n100001,0.5,0.5\n", header()),
    )
    .unwrap();

    let err = run(ws.config(ChannelDepth::Eight)).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::Parse { line: 2, .. }));
}

#[tokio::test]
async fn missing_image_directory_is_an_io_error() {
    let ws = Workspace::new();
    ws.solutions(&[]);
    let config = BenchmarkConfig {
        training_images: ws.path("nowhere"),
        ..ws.config(ChannelDepth::Eight)
    };
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::Io { .. }));
}

/// Survey exports name files `galaxy_<id>.png`; the table only has `<id>`.
struct SurveyIdentifier;

impl IdentifierSource for SurveyIdentifier {
    fn identifier(&self, path: &Path) -> galaxy_pixel_benchmark::Result<String> {
        let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        stem.strip_prefix("galaxy_")
            .map(str::to_string)
            .ok_or_else(|| BenchmarkError::DataIntegrity(format!("unexpected file {stem}")))
    }
}

#[tokio::test]
async fn custom_identifier_source_names_the_output_rows() {
    let ws = Workspace::new();
    ws.training("galaxy_100001", &galaxy([120, 120, 120]));
    ws.training("galaxy_100002", &galaxy([121, 120, 121]));
    ws.test("galaxy_200001", &galaxy([90, 90, 90]));
    ws.test("galaxy_200002", &galaxy([200, 0, 100]));
    ws.solutions(&[one_hot_row("100001", 0), one_hot_row("100002", 1)]);

    let summary = BenchmarkPipeline::new(ws.config(ChannelDepth::Eight))
        .unwrap()
        .with_identifier_source(Arc::new(SurveyIdentifier))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.clusters, 1);
    assert_eq!(summary.misses, 1);

    let lines = ws.output_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], zeros_after("200001", &["0.5", "0.5"]));
    assert_eq!(lines[2], zeros_after("200002", &[]));
}

#[tokio::test]
async fn default_identifiers_do_not_match_prefixed_solutions() {
    let ws = Workspace::new();
    ws.training("galaxy_100001", &galaxy([120, 120, 120]));
    ws.test("galaxy_200001", &galaxy([90, 90, 90]));
    ws.solutions(&[one_hot_row("100001", 0)]);

    let err = run(ws.config(ChannelDepth::Eight)).await.unwrap_err();
    assert!(matches!(err, BenchmarkError::MissingLabels { ref identifier } if identifier == "galaxy_100001"));
}
