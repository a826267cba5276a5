//! Gallery merging: structural deduplication of shared drawable items.

use capx::{GalleryFile, Score};

const SCORE_WITH_GALLERY: &str = r#"<score xmlns="http://www.capella.de/CapXML/2.0">
  <gallery>
    <drawObj name="segno"><text><content>S</content></text></drawObj>
  </gallery>
  <layout><staves><staffLayout description="S"/></staves></layout>
  <systems/>
</score>"#;

const SCORE_WITHOUT_GALLERY: &str = r#"<score xmlns="http://www.capella.de/CapXML/2.0">
  <layout><staves><staffLayout description="S"/></staves></layout>
  <systems/>
</score>"#;

const GALLERY: &str = r#"<gallery xmlns="http://www.capella.de/CagXML/3.0">
  <drawObj name="segno"><text><content>S</content></text></drawObj>
  <drawObj name="coda"><text><content>O</content></text></drawObj>
</gallery>"#;

fn gallery_item_count(score: &Score) -> usize {
    let doc = score.document();
    let gallery = doc.find(doc.root(), "gallery").expect("gallery element");
    doc.children(gallery).len()
}

#[test]
fn merging_skips_structurally_identical_items() {
    let mut score = Score::from_xml(SCORE_WITH_GALLERY).unwrap();
    let gallery = GalleryFile::from_xml(GALLERY).unwrap();
    assert_eq!(gallery_item_count(&score), 1);

    score.merge_gallery(&gallery);
    // "segno" already exists and is skipped; "coda" is appended
    assert_eq!(gallery_item_count(&score), 2);

    // merging again changes nothing
    score.merge_gallery(&gallery);
    assert_eq!(gallery_item_count(&score), 2);
}

#[test]
fn duplicates_within_one_fragment_are_merged_once() {
    let mut score = Score::from_xml(SCORE_WITH_GALLERY).unwrap();
    let gallery = GalleryFile::from_xml(
        r#"<gallery>
  <drawObj name="coda"><text><content>O</content></text></drawObj>
  <drawObj name="coda"><text><content>O</content></text></drawObj>
</gallery>"#,
    )
    .unwrap();
    score.merge_gallery(&gallery);
    // segno from the score plus a single coda
    assert_eq!(gallery_item_count(&score), 2);
}

#[test]
fn items_with_different_structure_are_not_deduplicated() {
    let mut score = Score::from_xml(SCORE_WITH_GALLERY).unwrap();
    let variant = GalleryFile::from_xml(
        r#"<gallery><drawObj name="segno"><text><content>S2</content></text></drawObj></gallery>"#,
    )
    .unwrap();
    score.merge_gallery(&variant);
    assert_eq!(gallery_item_count(&score), 2);
}

#[test]
fn whole_fragment_becomes_gallery_when_none_exists() {
    let mut score = Score::from_xml(SCORE_WITHOUT_GALLERY).unwrap();
    let gallery = GalleryFile::from_xml(GALLERY).unwrap();
    score.merge_gallery(&gallery);
    assert_eq!(gallery_item_count(&score), 2);
}
