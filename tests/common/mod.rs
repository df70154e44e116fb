use camino::Utf8PathBuf;
use mars2g4bl::G4blBeam;

/// A fresh output path in the system temporary directory.
pub fn temp_beam_path(name: &str) -> Utf8PathBuf {
    let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .expect("temporary directory is not valid UTF-8");
    let path = dir.join(format!("mars2g4bl_{}_{name}.beam", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

pub fn assert_event_ids_contiguous(beam: &G4blBeam) {
    let ids: Vec<u64> = beam.tracks().iter().map(|t| t.event_id).collect();
    let expected: Vec<u64> = (1..=beam.len() as u64).collect();
    assert_eq!(ids, expected);
}
