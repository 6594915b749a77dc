use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::outline::{deck_outline, Block, DeckSlide};
use super::ExportError;
use crate::core::shared::utils::escape_xml;
use crate::reports::AuditDeck;

const SLIDE_WIDTH: i64 = 9_144_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
const MARGIN: i64 = 457_200;
const ACCENT: &str = "1F4E79";

/// Builds a PowerPoint deck. Entry timestamps are fixed so identical decks
/// produce identical archives.
pub fn render_pptx(deck: &AuditDeck) -> Result<Vec<u8>, ExportError> {
    let slides = deck_outline(deck);
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut parts: Vec<(String, String)> = vec![
            (
                "[Content_Types].xml".to_string(),
                content_types_xml(slides.len()),
            ),
            ("_rels/.rels".to_string(), root_rels_xml()),
            ("ppt/presentation.xml".to_string(), presentation_xml(slides.len())),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                presentation_rels_xml(slides.len()),
            ),
        ];
        for (idx, slide) in slides.iter().enumerate() {
            let num = idx + 1;
            parts.push((format!("ppt/slides/slide{num}.xml"), slide_xml(slide, idx == 0)));
            parts.push((
                format!("ppt/slides/_rels/slide{num}.xml.rels"),
                slide_rels_xml(),
            ));
        }
        parts.extend([
            (
                "ppt/slideLayouts/slideLayout1.xml".to_string(),
                slide_layout_xml(),
            ),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
                slide_layout_rels_xml(),
            ),
            (
                "ppt/slideMasters/slideMaster1.xml".to_string(),
                slide_master_xml(),
            ),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                slide_master_rels_xml(),
            ),
            ("ppt/theme/theme1.xml".to_string(), theme_xml()),
            ("docProps/app.xml".to_string(), app_xml(slides.len())),
            ("docProps/core.xml".to_string(), core_xml(deck)),
        ]);

        for (name, body) in parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(body.as_bytes())?;
        }
        zip.finish()?;
    }

    Ok(buf.into_inner())
}

fn content_types_xml(slide_count: usize) -> String {
    let mut slide_types = String::new();
    for i in 1..=slide_count {
        slide_types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
{slide_types}
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#
    )
}

fn root_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
        .to_string()
}

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|idx| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + idx, idx + 2))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1">
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{slide_ids}</p:sldIdLst>
<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}" type="screen4x3"/>
<p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    );
    for i in 1..=slide_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{i}.xml"/>"#,
            i + 1
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>"#,
        slide_count + 2
    ));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
{rels}
</Relationships>"#
    )
}

fn run(text: &str, size: u32, bold: bool, color: Option<&str>) -> String {
    let bold_attr = if bold { r#" b="1""# } else { "" };
    let fill = color
        .map(|c| format!(r#"<a:solidFill><a:srgbClr val="{c}"/></a:solidFill>"#))
        .unwrap_or_default();
    format!(
        r#"<a:r><a:rPr lang="en-US" sz="{}"{bold_attr}>{fill}</a:rPr><a:t>{}</a:t></a:r>"#,
        size * 100,
        escape_xml(text)
    )
}

fn paragraph(runs: &str, bullet: bool) -> String {
    if bullet {
        format!(
            r#"<a:p><a:pPr marL="285750" indent="-285750"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>{runs}</a:p>"#
        )
    } else {
        format!("<a:p>{runs}</a:p>")
    }
}

fn text_box(id: u32, name: &str, off: (i64, i64), ext: (i64, i64), paragraphs: &str) -> String {
    let (x, y) = off;
    let (cx, cy) = ext;
    format!(
        r#"<p:sp>
<p:nvSpPr><p:cNvPr id="{id}" name="{name} {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody>
</p:sp>"#
    )
}

fn body_paragraphs(slide: &DeckSlide) -> String {
    let mut out = String::new();
    for block in &slide.blocks {
        match block {
            Block::Paragraph(text) => out.push_str(&paragraph(&run(text, 16, false, None), false)),
            Block::Bullets(items) => {
                for item in items {
                    out.push_str(&paragraph(&run(item, 16, false, None), true));
                }
            }
            Block::Table(rows) => {
                for (label, value) in rows {
                    let runs = format!(
                        "{}{}",
                        run(&format!("{label}: "), 16, true, None),
                        run(value, 16, false, None)
                    );
                    out.push_str(&paragraph(&runs, false));
                }
            }
        }
    }
    out
}

fn slide_xml(slide: &DeckSlide, is_title: bool) -> String {
    let width = SLIDE_WIDTH - 2 * MARGIN;
    let mut shapes = String::new();

    if is_title {
        shapes.push_str(&text_box(
            2,
            "Title",
            (MARGIN, 2_286_000),
            (width, 1_143_000),
            &paragraph(&run(&slide.title, 36, true, Some(ACCENT)), false),
        ));
        let mut sub = String::new();
        if let Some(subtitle) = &slide.subtitle {
            sub.push_str(&paragraph(&run(subtitle, 18, false, None), false));
        }
        sub.push_str(&body_paragraphs(slide));
        shapes.push_str(&text_box(
            3,
            "Subtitle",
            (MARGIN, 3_543_300),
            (width, 1_371_600),
            &sub,
        ));
    } else {
        let mut heading = paragraph(&run(&slide.title, 28, true, Some(ACCENT)), false);
        if let Some(subtitle) = &slide.subtitle {
            heading.push_str(&paragraph(&run(subtitle, 14, false, None), false));
        }
        shapes.push_str(&text_box(2, "Title", (MARGIN, MARGIN), (width, 1_005_840), &heading));
        shapes.push_str(&text_box(
            3,
            "Content",
            (MARGIN, 1_554_480),
            (width, SLIDE_HEIGHT - 1_554_480 - MARGIN),
            &body_paragraphs(slide),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#
    )
}

fn slide_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
</Relationships>"#
        .to_string()
}

fn slide_layout_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank">
<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#
        .to_string()
}

fn slide_layout_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#
        .to_string()
}

fn slide_master_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#
        .to_string()
}

fn slide_master_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#
        .to_string()
}

fn theme_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Ledgr">
<a:themeElements>
<a:clrScheme name="Ledgr">
<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
<a:dk2><a:srgbClr val="44546A"/></a:dk2>
<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
<a:accent1><a:srgbClr val="{ACCENT}"/></a:accent1>
<a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
<a:accent4><a:srgbClr val="FFC000"/></a:accent4>
<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
<a:accent6><a:srgbClr val="70AD47"/></a:accent6>
<a:hlink><a:srgbClr val="0563C1"/></a:hlink>
<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
</a:clrScheme>
<a:fontScheme name="Ledgr">
<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
</a:fontScheme>
<a:fmtScheme name="Ledgr">
<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>
<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>
<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>
<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>
</a:fmtScheme>
</a:themeElements>
</a:theme>"#
    )
}

fn app_xml(slide_count: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>Ledgr</Application>
<Slides>{slide_count}</Slides>
</Properties>"#
    )
}

fn core_xml(deck: &AuditDeck) -> String {
    let stamp = deck.generated_at.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{}</dc:title>
<dc:subject>{}</dc:subject>
<dc:creator>Ledgr</dc:creator>
<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>
</cp:coreProperties>"#,
        escape_xml(&deck.title),
        escape_xml(&deck.company_name)
    )
}
