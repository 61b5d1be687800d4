use pitchtrack::calibration::NoLabels;
use pitchtrack::error::Error;
use pitchtrack::{
    Config, DctHasher, Detection, FieldLine, Frame, ImageHash, LineEquation, Pipeline,
    PipelineState, Segment,
};
use serde_derive::Deserialize;

#[derive(Deserialize)]
struct LabeledLine {
    label: FieldLine,
    a: f64,
    b: f64,
    c: f64,
}

/// One recorded frame per input line.
#[derive(Deserialize)]
struct Record {
    hash: Option<u64>,
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    segments: Vec<Segment>,
    #[serde(default)]
    lines: Vec<LabeledLine>,
}

impl Record {
    fn into_frame(self, index: u64) -> Frame {
        let mut frame = Frame::new(index);
        frame.hash = self.hash.map(ImageHash::from_u64);
        frame.detections = self.detections;
        frame.segments = self.segments;
        frame.labeled_lines = self
            .lines
            .into_iter()
            .filter_map(|l| Some(LineEquation::new(l.a, l.b, l.c)?.labeled(l.label)))
            .collect();

        frame
    }
}

fn main() -> Result<(), Error> {
    use std::io::BufRead;

    let mut args = std::env::args();

    let _ = args.next();
    let in_file_name = args
        .next()
        .ok_or_else(|| Error::Source("expected recorded frames file name".to_string()))?;
    let file = std::fs::File::open(&in_file_name).map_err(|e| Error::Source(e.to_string()))?;

    let frames = std::io::BufReader::new(file)
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Source(e.to_string()))),
            };

            if line.trim().is_empty() {
                return None;
            }

            match serde_json::from_str::<Record>(&line) {
                Ok(rec) => Some(Ok(rec.into_frame(idx as u64))),
                Err(e) => {
                    eprintln!("wrong file format at line {}: {}", idx + 1, e);
                    None
                }
            }
        });

    let config = Config::default();
    let pipeline = Pipeline::new(&config, DctHasher::new(), NoLabels);

    let (_, res) = pipeline.run(PipelineState::new(&config), frames, |report| {
        if report.scene_changed {
            println!("# frame {}: scene changed", report.index);
        }

        for t in &report.tracks {
            println!(
                "{} {} {:.2} {:.2} {}",
                report.index,
                t.track_id,
                t.position.x,
                t.position.y,
                if t.predicted { "p" } else { "m" }
            );
        }
    });

    let processed = res?;
    eprintln!("processed {processed} frames");

    Ok(())
}
