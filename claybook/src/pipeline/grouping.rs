use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ConversionJob;
use crate::config::Config;

/// Display metadata of one chapter. Names are used as file names as they
/// are; making them safe is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
    pub name: String,
    /// `None` for chapters that do not belong to a volume.
    pub volume: Option<String>,
}

/// The downloaded images of one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBatch {
    pub chapter: ChapterInfo,
    /// Images in page order.
    pub images: Vec<PathBuf>,
    /// Chapter boundary page shown before the chapter in merged books.
    pub marker: Option<PathBuf>,
    /// Directory holding the images, removed once the job using it ends.
    pub staging_dir: Option<PathBuf>,
}

/// How chapters are bound into output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookGrouping {
    /// One file per chapter.
    PerChapter,
    /// All chapters in one file called `name`.
    SingleMerged { name: String },
    /// One file per volume, in the order volumes first appear.
    PerVolume,
}

const NO_VOLUME: &str = "No Volume";

fn volume_name(volume: Option<&str>) -> String {
    match volume {
        Some(volume) => format!("Vol. {}", volume),
        None => NO_VOLUME.to_owned(),
    }
}

/// Turn ordered chapter batches into one job per output file.
pub fn plan_jobs(grouping: &BookGrouping, batches: Vec<ChapterBatch>, config: &Config) -> Vec<ConversionJob> {
    let jobs = match grouping {
        BookGrouping::PerChapter => batches
            .into_iter()
            .map(|batch| {
                let name = batch.chapter.name.clone();
                merged(name, vec![batch], false, config)
            })
            .collect(),
        BookGrouping::SingleMerged { .. } if batches.is_empty() => Vec::new(),
        BookGrouping::SingleMerged { name } => {
            vec![merged(name.clone(), batches, !config.skip_chapter_markers, config)]
        }
        BookGrouping::PerVolume => {
            let mut volumes: IndexMap<Option<String>, Vec<ChapterBatch>> = IndexMap::new();
            for batch in batches {
                volumes.entry(batch.chapter.volume.clone()).or_default().push(batch);
            }
            volumes
                .into_iter()
                .map(|(volume, batches)| {
                    merged(volume_name(volume.as_deref()), batches, !config.skip_chapter_markers, config)
                })
                .collect()
        }
    };
    log::debug!("{:?} grouping planned {} jobs", grouping, jobs.len());
    jobs
}

fn merged(name: String, batches: Vec<ChapterBatch>, markers: bool, config: &Config) -> ConversionJob {
    let mut sources = Vec::new();
    let mut staging_dirs: Vec<PathBuf> = Vec::new();
    for batch in batches {
        if markers {
            sources.extend(batch.marker);
        }
        sources.extend(batch.images);
        if let Some(dir) = batch.staging_dir {
            if !staging_dirs.contains(&dir) {
                staging_dirs.push(dir);
            }
        }
    }

    let target = config.output_dir.join(format!("{}.pdf", name));
    ConversionJob {
        name,
        sources,
        target,
        replace: config.replace,
        staging_dirs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(name: &str, volume: Option<&str>, pages: usize) -> ChapterBatch {
        let dir = PathBuf::from(format!("staging/{}", volume.unwrap_or("none")));
        ChapterBatch {
            chapter: ChapterInfo {
                name: name.to_owned(),
                volume: volume.map(str::to_owned),
            },
            images: (0..pages).map(|i| dir.join(format!("{}-{:02}.png", name, i))).collect(),
            marker: Some(dir.join(format!("{}-marker.png", name))),
            staging_dir: Some(dir),
        }
    }

    fn config() -> Config {
        Config {
            output_dir: PathBuf::from("out"),
            ..Config::default()
        }
    }

    #[test]
    fn per_chapter_has_no_markers() {
        let jobs = plan_jobs(
            &BookGrouping::PerChapter,
            vec![batch("Ch. 1", Some("1"), 2), batch("Ch. 2", None, 1)],
            &config(),
        );
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].target, PathBuf::from("out/Ch. 1.pdf"));
        assert_eq!(jobs[0].sources.len(), 2);
        assert_eq!(jobs[1].sources, vec![PathBuf::from("staging/none/Ch. 2-00.png")]);
        assert_eq!(jobs[1].staging_dirs, vec![PathBuf::from("staging/none")]);
    }

    #[test]
    fn per_volume_in_first_appearance_order() {
        let jobs = plan_jobs(
            &BookGrouping::PerVolume,
            vec![
                batch("Ch. 1", Some("1"), 1),
                batch("Ch. 3", None, 1),
                batch("Ch. 2", Some("1"), 1),
            ],
            &config(),
        );
        let names: Vec<_> = jobs.iter().map(|job| job.name.as_str()).collect();
        assert_eq!(names, ["Vol. 1", "No Volume"]);
        assert_eq!(jobs[0].target, PathBuf::from("out/Vol. 1.pdf"));
        assert_eq!(
            jobs[0].sources,
            [
                "staging/1/Ch. 1-marker.png",
                "staging/1/Ch. 1-00.png",
                "staging/1/Ch. 2-marker.png",
                "staging/1/Ch. 2-00.png",
            ]
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>()
        );
        assert_eq!(jobs[0].staging_dirs.len(), 1);
        assert_eq!(jobs[1].sources.len(), 2);
    }

    #[test]
    fn merged_markers_can_be_skipped() {
        let config = Config {
            skip_chapter_markers: true,
            replace: true,
            ..config()
        };
        let grouping = BookGrouping::SingleMerged {
            name: "Book".to_owned(),
        };
        let jobs = plan_jobs(&grouping, vec![batch("a", None, 2), batch("b", Some("2"), 3)], &config);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].sources.len(), 5);
        assert!(jobs[0].replace);
        assert_eq!(jobs[0].staging_dirs.len(), 2);
        assert_eq!(jobs[0].target, PathBuf::from("out/Book.pdf"));
    }

    #[test]
    fn nothing_to_merge() {
        let grouping = BookGrouping::SingleMerged {
            name: "Book".to_owned(),
        };
        assert!(plan_jobs(&grouping, Vec::new(), &config()).is_empty());
    }
}
