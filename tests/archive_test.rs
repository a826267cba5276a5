//! Archive round trip: reading the score entry out of a .capx container and
//! persisting it back without disturbing other entries or the comment.

use capx::{ArchiveError, Score, ScoreError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const SCORE_XML: &str = r#"<score xmlns="http://www.capella.de/CapXML/2.0">
  <layout><staves><staffLayout description="S"/></staves></layout>
  <systems><system><staves>
    <staff layout="S" defaultTime="4/4">
      <voices><voice><noteObjects>
        <chord>
          <duration base="1/4"/>
          <heads><head pitch="C5"/></heads>
          <drawObjects>
            <drawObj><text><content>{P:3}</content></text></drawObj>
          </drawObjects>
        </chord>
      </noteObjects></voice></voices>
    </staff>
  </staves></system></systems>
</score>"#;

fn write_capx(path: &Path) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    writer.set_raw_comment(b"created by capella".to_vec());
    writer
        .start_file("score.xml", FileOptions::default())
        .unwrap();
    writer.write_all(SCORE_XML.as_bytes()).unwrap();
    writer
        .start_file("preview.png", FileOptions::default())
        .unwrap();
    writer.write_all(b"\x89PNG fake preview bytes").unwrap();
    writer.finish().unwrap();
}

#[test]
fn open_reads_the_score_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.capx");
    write_capx(&path);

    let score = Score::open(&path).unwrap();
    let parts = score.parts().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "S");
}

#[test]
fn open_without_score_entry_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.capx");
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    writer
        .start_file("preview.png", FileOptions::default())
        .unwrap();
    writer.write_all(b"only a preview").unwrap();
    writer.finish().unwrap();

    match Score::open(&path) {
        Err(ScoreError::Archive(ArchiveError::MissingEntry { entry })) => {
            assert_eq!(entry, "score.xml");
        }
        other => panic!("expected missing entry error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn persist_replaces_only_the_score_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.capx");
    write_capx(&path);

    let mut score = Score::open(&path).unwrap();
    let mut tag = {
        let voice = &score.parts().unwrap()[0].voices()[0][0];
        voice.text_objects(score.document())[0].as_tag().unwrap()
    };
    tag.set_value(score.document_mut(), "7");
    score.persist().unwrap();

    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.comment(), b"created by capella");
    assert_eq!(archive.len(), 2);

    let mut preview = Vec::new();
    archive
        .by_name("preview.png")
        .unwrap()
        .read_to_end(&mut preview)
        .unwrap();
    assert_eq!(preview, b"\x89PNG fake preview bytes");

    drop(preview);
    let reopened = Score::open(&path).unwrap();
    let voice = &reopened.parts().unwrap()[0].voices()[0][0];
    let texts = voice.text_objects(reopened.document());
    assert_eq!(texts[0].text(), "{P:7}");

    // the rewritten document carries the namespace on its root
    let mut xml = String::new();
    ZipArchive::new(File::open(&path).unwrap())
        .unwrap()
        .by_name("score.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains("http://www.capella.de/CapXML/2.0"));
}

#[test]
fn score_from_string_cannot_persist() {
    let mut score = Score::from_xml(SCORE_XML).unwrap();
    assert!(matches!(
        score.persist(),
        Err(ScoreError::NoBackingArchive)
    ));
}
