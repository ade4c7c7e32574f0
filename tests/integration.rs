//! Integration tests for the deck-merge library
//!
//! Fixture decks are generated in place: each is a minimal but
//! structurally complete .pptx package whose slides carry a marker text,
//! so merge order can be asserted from the output. PDFs are generated
//! with lopdf.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use deck_merge::error::Error;
use deck_merge::pdf::{count_pages, PdfExporter, PdfMerger};
use deck_merge::pipeline::{
    merge_direct, merge_via_pdf, merge_via_pdf_with, DirectMergeOptions, PdfMergeOptions,
};
use deck_merge::pptx::{count_slides, presentation, rels, Package};

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Write a minimal deck with `slides` slides whose text markers are
/// `"<tag> slide <n>"`. With `with_image` the first slide also embeds a
/// PNG part.
fn write_deck(path: &Path, tag: &str, slides: usize, with_image: bool) {
    let file = fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>"#,
        NS_CT
    );
    if with_image {
        types.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
    }
    types.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
    types.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
    types.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
    for i in 1..=slides {
        types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            i
        ));
    }
    types.push_str("</Types>");
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(types.as_bytes()).unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
            NS_REL
        )
        .as_bytes(),
    )
    .unwrap();

    let mut sld_ids = String::new();
    let mut pres_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        NS_REL
    );
    for i in 1..=slides {
        sld_ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            255 + i,
            1 + i
        ));
        pres_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            1 + i,
            i
        ));
    }
    pres_rels.push_str("</Relationships>");

    zip.start_file("ppt/presentation.xml", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="{}" xmlns:r="{}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            NS_P, NS_R, sld_ids
        )
        .as_bytes(),
    )
    .unwrap();

    zip.start_file("ppt/_rels/presentation.xml.rels", options)
        .unwrap();
    zip.write_all(pres_rels.as_bytes()).unwrap();

    zip.start_file("ppt/slideMasters/slideMaster1.xml", options)
        .unwrap();
    zip.write_all(
        format!(r#"<p:sldMaster xmlns:p="{}"><p:cSld/></p:sldMaster>"#, NS_P).as_bytes(),
    )
    .unwrap();

    zip.start_file("ppt/slideLayouts/slideLayout1.xml", options)
        .unwrap();
    zip.write_all(
        format!(r#"<p:sldLayout xmlns:p="{}"><p:cSld/></p:sldLayout>"#, NS_P).as_bytes(),
    )
    .unwrap();

    for i in 1..=slides {
        zip.start_file(format!("ppt/slides/slide{}.xml", i), options)
            .unwrap();
        zip.write_all(
            format!(
                r#"<p:sld xmlns:p="{}" xmlns:a="{}" xmlns:r="{}"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{} slide {}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
                NS_P, NS_A, NS_R, tag, i
            )
            .as_bytes(),
        )
        .unwrap();

        let mut slide_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            NS_REL
        );
        if with_image && i == 1 {
            slide_rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>"#);
        }
        slide_rels.push_str("</Relationships>");
        zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", i), options)
            .unwrap();
        zip.write_all(slide_rels.as_bytes()).unwrap();
    }

    if with_image {
        zip.start_file("ppt/media/image1.png", options).unwrap();
        zip.write_all(b"\x89PNG\r\n\x1a\nfakepixels").unwrap();
    }

    zip.finish().unwrap();
}

/// Build a PDF with `pages` empty pages.
fn write_pdf(path: &Path, pages: usize) {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Marker texts of a deck's slides, in slide order.
fn slide_markers(path: &Path) -> Vec<String> {
    let pkg = Package::open(path).unwrap();
    let refs = presentation::slide_refs(pkg.part("ppt/presentation.xml").unwrap()).unwrap();
    let pres_rels = rels::parse(pkg.part("ppt/_rels/presentation.xml.rels").unwrap()).unwrap();
    let targets: HashMap<String, String> = pres_rels
        .into_iter()
        .map(|r| (r.id, r.target))
        .collect();

    refs.iter()
        .map(|slide| {
            let part = rels::resolve_target("ppt/presentation.xml", &targets[&slide.rid]);
            let xml = String::from_utf8(pkg.part(&part).unwrap().to_vec()).unwrap();
            let start = xml.find("<a:t>").unwrap() + 5;
            let end = xml.find("</a:t>").unwrap();
            xml[start..end].to_string()
        })
        .collect()
}

fn direct_options(base: &Path, folder: &str) -> DirectMergeOptions {
    DirectMergeOptions {
        base_dir: base.to_path_buf(),
        folder: folder.to_string(),
    }
}

fn pdf_options(base: &Path, folder: &str, keep_temp: bool) -> PdfMergeOptions {
    PdfMergeOptions {
        base_dir: base.to_path_buf(),
        folder: folder.to_string(),
        keep_temp,
        soffice: None,
        timeout: Duration::from_secs(5),
    }
}

/// Stand-in for the office converter: writes a 2-page PDF per deck,
/// failing for configured stems.
struct FakeExporter {
    fail: HashSet<String>,
}

impl FakeExporter {
    fn new() -> Self {
        Self {
            fail: HashSet::new(),
        }
    }

    fn failing(stems: &[&str]) -> Self {
        Self {
            fail: stems.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PdfExporter for FakeExporter {
    fn export_pdf(&self, source: &Path, out_dir: &Path) -> deck_merge::Result<PathBuf> {
        let stem = source.file_stem().unwrap().to_string_lossy().into_owned();
        if self.fail.contains(&stem) {
            return Err(Error::Conversion(
                source.to_path_buf(),
                "simulated converter failure".to_string(),
            ));
        }
        let dest = out_dir.join(format!("{}.pdf", stem));
        write_pdf(&dest, 2);
        Ok(dest)
    }
}

#[test]
fn test_direct_merge_concatenates_in_name_order() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    // written out of order on purpose; merge order is name order
    write_deck(&folder.join("b.pptx"), "b", 2, false);
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("c.pptx"), "c", 3, false);

    let summary = merge_direct(&direct_options(base.path(), "talks")).unwrap();
    assert_eq!(summary.merged, 3);
    assert_eq!(summary.failed, 0);

    let output = base.path().join("talks.pptx");
    assert!(output.exists());
    assert_eq!(count_slides(&output).unwrap(), 6);
    assert_eq!(
        slide_markers(&output),
        vec![
            "a slide 1",
            "b slide 1",
            "b slide 2",
            "c slide 1",
            "c slide 2",
            "c slide 3"
        ]
    );
}

#[test]
fn test_direct_merge_copies_media() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, true);

    merge_direct(&direct_options(base.path(), "talks")).unwrap();

    let output = Package::open(&base.path().join("talks.pptx")).unwrap();
    // b's image must exist in the output under a fresh media name
    let media: Vec<_> = output
        .part_names()
        .filter(|n| n.starts_with("ppt/media/"))
        .collect();
    assert_eq!(media.len(), 1);
    assert!(output.part(media[0]).unwrap().starts_with(b"\x89PNG"));

    // the appended slide's rels point at the copied image
    let slide_rels = rels::parse(output.part("ppt/slides/_rels/slide2.xml.rels").unwrap()).unwrap();
    let image = slide_rels
        .iter()
        .find(|r| r.rel_type == rels::TYPE_IMAGE)
        .unwrap();
    assert_eq!(
        rels::resolve_target("ppt/slides/slide2.xml", &image.target),
        media[0]
    );

    // and the png default was spliced into the seed's content types
    let text =
        String::from_utf8(output.part("[Content_Types].xml").unwrap().to_vec()).unwrap();
    assert!(text.contains(r#"Extension="png""#));
}

#[test]
fn test_direct_merge_skips_corrupt_file() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    fs::write(folder.join("b.pptx"), b"this is not a zip archive").unwrap();
    write_deck(&folder.join("c.pptx"), "c", 2, false);

    let summary = merge_direct(&direct_options(base.path(), "talks")).unwrap();
    assert_eq!(summary.merged, 2);
    assert_eq!(summary.failed, 1);

    let output = base.path().join("talks.pptx");
    assert_eq!(count_slides(&output).unwrap(), 3);
    assert_eq!(
        slide_markers(&output),
        vec!["a slide 1", "c slide 1", "c slide 2"]
    );
}

#[test]
fn test_direct_merge_corrupt_seed_candidate() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    // the would-be seed is corrupt; the next file must seed instead
    fs::write(folder.join("a.pptx"), b"garbage").unwrap();
    write_deck(&folder.join("b.pptx"), "b", 2, false);

    let summary = merge_direct(&direct_options(base.path(), "talks")).unwrap();
    assert_eq!(summary.merged, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        slide_markers(&base.path().join("talks.pptx")),
        vec!["b slide 1", "b slide 2"]
    );
}

#[test]
fn test_direct_merge_all_corrupt_is_no_output() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("a.pptx"), b"garbage").unwrap();
    fs::write(folder.join("b.pptx"), b"more garbage").unwrap();

    let result = merge_direct(&direct_options(base.path(), "talks"));
    assert!(matches!(result.unwrap_err(), Error::NoOutput));
    assert!(!base.path().join("talks.pptx").exists());
}

#[test]
fn test_both_pipelines_reject_missing_folder() {
    let base = TempDir::new().unwrap();

    let result = merge_direct(&direct_options(base.path(), "absent"));
    assert!(matches!(result.unwrap_err(), Error::FolderNotFound(_)));

    let result = merge_via_pdf_with(&pdf_options(base.path(), "absent", false), &FakeExporter::new());
    assert!(matches!(result.unwrap_err(), Error::FolderNotFound(_)));
}

#[test]
fn test_both_pipelines_reject_empty_folder() {
    let base = TempDir::new().unwrap();
    fs::create_dir(base.path().join("empty")).unwrap();

    let result = merge_direct(&direct_options(base.path(), "empty"));
    assert!(matches!(result.unwrap_err(), Error::NoInput(_)));
    assert!(!base.path().join("empty.pptx").exists());

    let result = merge_via_pdf_with(&pdf_options(base.path(), "empty", false), &FakeExporter::new());
    assert!(matches!(result.unwrap_err(), Error::NoInput(_)));
    assert!(!base.path().join("empty.pdf").exists());
}

#[test]
fn test_rerun_overwrites_deterministically() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, false);

    merge_direct(&direct_options(base.path(), "talks")).unwrap();
    let first = slide_markers(&base.path().join("talks.pptx"));

    merge_direct(&direct_options(base.path(), "talks")).unwrap();
    let second = slide_markers(&base.path().join("talks.pptx"));

    assert_eq!(first, second);
    assert_eq!(count_slides(&base.path().join("talks.pptx")).unwrap(), 2);
}

#[test]
fn test_conversion_merge_happy_path() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, false);
    write_deck(&folder.join("c.pptx"), "c", 1, false);

    let summary =
        merge_via_pdf_with(&pdf_options(base.path(), "talks", false), &FakeExporter::new())
            .unwrap();
    assert_eq!(summary.merged, 3);
    assert_eq!(summary.failed, 0);

    let output = base.path().join("talks.pdf");
    assert_eq!(count_pages(&output).unwrap(), 6);
    // intermediates are cleaned up after the run
    assert!(!folder.join(".pdf-temp").exists());
}

#[test]
fn test_conversion_merge_partial_failure_still_succeeds() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, false);
    write_deck(&folder.join("c.pptx"), "c", 1, false);

    let summary = merge_via_pdf_with(
        &pdf_options(base.path(), "talks", false),
        &FakeExporter::failing(&["b"]),
    )
    .unwrap();
    assert_eq!(summary.merged, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(count_pages(&base.path().join("talks.pdf")).unwrap(), 4);
}

#[test]
fn test_conversion_merge_all_fail_cleans_up() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, false);

    let result = merge_via_pdf_with(
        &pdf_options(base.path(), "talks", false),
        &FakeExporter::failing(&["a", "b"]),
    );
    assert!(matches!(result.unwrap_err(), Error::NoOutput));
    assert!(!base.path().join("talks.pdf").exists());
    // no leaked intermediates
    assert!(!folder.join(".pdf-temp").exists());
}

#[test]
fn test_conversion_merge_keep_temp_retains_intermediates() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);
    write_deck(&folder.join("b.pptx"), "b", 1, false);

    merge_via_pdf_with(&pdf_options(base.path(), "talks", true), &FakeExporter::new()).unwrap();

    let temp = folder.join(".pdf-temp");
    let mut names: Vec<_> = fs::read_dir(&temp)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    // one intermediate per input, traceable to its source deck
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);
}

#[test]
fn test_conversion_merge_unavailable_converter_fails_fast() {
    let base = TempDir::new().unwrap();
    let folder = base.path().join("talks");
    fs::create_dir(&folder).unwrap();
    write_deck(&folder.join("a.pptx"), "a", 1, false);

    let mut options = pdf_options(base.path(), "talks", false);
    options.soffice = Some(PathBuf::from("/no/such/soffice"));

    let result = merge_via_pdf(&options);
    assert!(matches!(result.unwrap_err(), Error::Unavailable(_)));
    assert!(!base.path().join("talks.pdf").exists());
    // nothing was converted, so nothing was staged
    assert!(!folder.join(".pdf-temp").exists());
}

#[test]
fn test_pdf_merger_page_counts() {
    let dir = TempDir::new().unwrap();
    let one = dir.path().join("one.pdf");
    let two = dir.path().join("two.pdf");
    write_pdf(&one, 1);
    write_pdf(&two, 3);

    let mut merger = PdfMerger::new();
    assert_eq!(merger.append(&one).unwrap(), 1);
    assert_eq!(merger.append(&two).unwrap(), 3);
    assert_eq!(merger.doc_count(), 2);
    assert_eq!(merger.page_count(), 4);

    let output = dir.path().join("merged.pdf");
    merger.save(&output).unwrap();
    assert_eq!(count_pages(&output).unwrap(), 4);
}
