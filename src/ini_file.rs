// ini_file.rs — Minimal INI document for desktop.ini descriptors
//
// Keeps the file as an ordered list of lines grouped by section so an edit
// touches only the entry it changes: comments, blank lines, and untouched
// entries are written back exactly as they were read.
//
// Section and key lookups are case-insensitive, matching the Windows
// profile APIs (GetPrivateProfileString / WritePrivateProfileString) that
// Explorer itself uses to read these files.

use std::fs;
use std::io;
use std::path::Path;

const LINE_ENDING: &str = "\r\n";
const UTF8_BOM:    [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];





/// On-disk text encoding of a document.  Whatever was read is what gets
/// written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,

    /// Single-byte code page text (not valid UTF-8).  Each byte is held as
    /// the char with the same value, so untouched bytes round-trip exactly.
    Ansi,
}





#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// `key = value`; `raw` holds the original text until the entry is edited
    Entry {
        key:   String,
        value: String,
        raw:   Option<String>,
    },

    /// Blank line, comment, or anything else we pass through untouched
    Other(String),
}





#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name:   String,
    header: String,
    lines:  Vec<Line>,
}





/// Parsed INI document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IniDocument {
    preamble: Vec<String>,
    sections: Vec<Section>,
    encoding: TextEncoding,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Line
//
//  Entry helpers.
//
////////////////////////////////////////////////////////////////////////////////

impl Line {
    fn is_entry_for(&self, key: &str) -> bool {
        matches!(self, Line::Entry { key: k, .. } if k.eq_ignore_ascii_case(key))
    }

    fn render(&self) -> String {
        match self {
            Line::Entry { raw: Some(raw), .. } => raw.clone(),
            Line::Entry { key, value, raw: None } => format!("{key}={value}"),
            Line::Other(text) => text.clone(),
        }
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Section
//
//  Entry lookup within one section.
//
////////////////////////////////////////////////////////////////////////////////

impl Section {
    fn has_entries(&self) -> bool {
        self.lines.iter().any(|l| matches!(l, Line::Entry { .. }))
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.is_entry_for(key))
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl IniDocument
//
//  Parse, query, edit, and serialize.
//
////////////////////////////////////////////////////////////////////////////////

impl IniDocument {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  parse
    //
    //  Parse INI text.  Never fails: lines that are neither a section header
    //  nor a key=value pair are carried along verbatim.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn parse(text: &str) -> Self {
        let mut doc = IniDocument::default();
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

        for line in text.lines() {
            let trimmed = line.trim();

            if let Some(name) = parse_section_header(trimmed) {
                doc.sections.push(Section {
                    name:   name.to_string(),
                    header: line.to_string(),
                    lines:  Vec::new(),
                });
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                doc.preamble.push(line.to_string());
                continue;
            };

            let is_comment = trimmed.starts_with(';') || trimmed.starts_with('#');

            match trimmed.split_once('=') {
                Some((key, value)) if !is_comment && !key.trim().is_empty() => {
                    section.lines.push(Line::Entry {
                        key:   key.trim().to_string(),
                        value: value.trim().to_string(),
                        raw:   Some(line.to_string()),
                    });
                }
                _ => section.lines.push(Line::Other(line.to_string())),
            }
        }

        doc
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  load
    //
    //  Read and parse a file in whatever encoding it was saved with.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn load(path: &Path) -> io::Result<Self> {
        let (text, encoding) = decode(fs::read(path)?)?;

        let mut doc = Self::parse(&text);
        doc.encoding = encoding;
        Ok(doc)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  save
    //
    //  Overwrite an existing file in place.  Opens with truncate and without
    //  create: Windows refuses CREATE_ALWAYS on hidden or system files but
    //  allows truncating them.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn save(&self, path: &Path) -> io::Result<()> {
        use std::io::Write;

        let mut file = fs::OpenOptions::new().write(true).truncate(true).open(path)?;
        file.write_all(&self.to_bytes())?;
        file.flush()
    }





    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  to_bytes
    //
    //  Serialize in the document's encoding.  ANSI text that no longer fits
    //  in one byte per character is written as UTF-16LE instead.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_string();

        match self.encoding {
            TextEncoding::Utf8    => text.into_bytes(),
            TextEncoding::Utf8Bom => [&UTF8_BOM[..], text.as_bytes()].concat(),
            TextEncoding::Utf16Le => encode_utf16le(&text),

            // An edit may add characters the code page cannot hold
            TextEncoding::Ansi => encode_single_byte(&text).unwrap_or_else(|| encode_utf16le(&text)),
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  section_names
    //
    //  Section names in file order.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.find_section(section).is_some()
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  section_has_entries
    //
    //  True if the section exists and holds at least one key.  Comments and
    //  blank lines do not count.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn section_has_entries(&self, section: &str) -> bool {
        self.find_section(section)
            .map(|i| self.sections[i].has_entries())
            .unwrap_or(false)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  get
    //
    //  Value of `key` in `section`, if present.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let section = &self.sections[self.find_section(section)?];

        section.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k.eq_ignore_ascii_case(key) => Some(value.as_str()),
            _ => None,
        })
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set
    //
    //  Upsert `key = value` in `section`, creating the section at the end of
    //  the document if needed.  An existing key (matched without regard to
    //  case) is rewritten in place under the new spelling; a new key goes
    //  after the section's last entry.  Returns false if nothing changed.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        let index = match self.find_section(section) {
            Some(i) => i,
            None => {
                self.sections.push(Section {
                    name:   section.to_string(),
                    header: format!("[{section}]"),
                    lines:  Vec::new(),
                });
                self.sections.len() - 1
            }
        };

        let target = &mut self.sections[index];
        let entry  = Line::Entry {
            key:   key.to_string(),
            value: value.to_string(),
            raw:   None,
        };

        match target.position_of(key) {
            Some(pos) => {
                if let Line::Entry { key: k, value: v, .. } = &target.lines[pos]
                    && k == key
                    && v == value
                {
                    return false;
                }
                target.lines[pos] = entry;
            }
            None => {
                let insert_at = target
                    .lines
                    .iter()
                    .rposition(|l| matches!(l, Line::Entry { .. }))
                    .map(|p| p + 1)
                    .unwrap_or(0);
                target.lines.insert(insert_at, entry);
            }
        }

        true
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove_key
    //
    //  Delete `key` from `section`.  Returns false if it was not there.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(index) = self.find_section(section) else {
            return false;
        };

        let target = &mut self.sections[index];
        match target.position_of(key) {
            Some(pos) => {
                target.lines.remove(pos);
                true
            }
            None => false,
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove_section
    //
    //  Delete a whole section, including any comments and blank lines that
    //  belong to it.  Returns false if it was not there.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn remove_section(&mut self, section: &str) -> bool {
        match self.find_section(section) {
            Some(index) => {
                self.sections.remove(index);
                true
            }
            None => false,
        }
    }





    fn find_section(&self, section: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name.eq_ignore_ascii_case(section))
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Display for IniDocument
//
//  Serialize with CRLF line endings, one terminator per line.
//
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for IniDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.preamble {
            write!(f, "{line}{LINE_ENDING}")?;
        }

        for section in &self.sections {
            write!(f, "{}{LINE_ENDING}", section.header)?;
            for line in &section.lines {
                write!(f, "{}{LINE_ENDING}", line.render())?;
            }
        }

        Ok(())
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  parse_section_header
//
//  "[Name]" → Some("Name").  Anything after the closing bracket is ignored,
//  as the profile APIs do.
//
////////////////////////////////////////////////////////////////////////////////

fn parse_section_header(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix('[')?;
    let close = inner.find(']')?;
    Some(inner[..close].trim())
}





////////////////////////////////////////////////////////////////////////////////
//
//  decode
//
//  UTF-16LE and UTF-8 are recognized by their byte order marks, then UTF-8
//  without one.  Anything else is code page text.
//
////////////////////////////////////////////////////////////////////////////////

fn decode(bytes: Vec<u8>) -> io::Result<(String, TextEncoding)> {
    if let Some(body) = bytes.strip_prefix(&UTF16LE_BOM) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text = String::from_utf16(&units)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        return Ok((text, TextEncoding::Utf16Le));
    }

    if let Some(body) = bytes.strip_prefix(&UTF8_BOM)
        && let Ok(text) = std::str::from_utf8(body)
    {
        return Ok((text.to_string(), TextEncoding::Utf8Bom));
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok((text, TextEncoding::Utf8)),
        Err(e) => Ok((e.into_bytes().into_iter().map(char::from).collect(), TextEncoding::Ansi)),
    }
}





fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = UTF16LE_BOM.to_vec();
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}





/// Inverse of the ANSI decode; `None` if any char is above U+00FF.
fn encode_single_byte(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(c).ok()).collect()
}





#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[.ShellClassInfo]\r\n\
                          iconresource =C:\\Windows\\System32\\SHELL32.dll,5\r\n\
                          \r\n\
                          [ViewState]\r\n\
                          mode =\r\n\
                          vid =\r\n\
                          foldertype =Generic\r\n";

    ////////////////////////////////////////////////////////////////////////////
    //
    //  parse_and_serialize_is_lossless
    //
    //  Untouched documents serialize back byte for byte.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn parse_and_serialize_is_lossless() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.to_string(), SAMPLE);

        let names: Vec<&str> = doc.section_names().collect();
        assert_eq!(names, vec![".ShellClassInfo", "ViewState"]);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  get_is_case_insensitive
    //
    //  Section and key names match without regard to case; values are
    //  trimmed.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn get_is_case_insensitive() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.get(".shellclassinfo", "IconResource"), Some(r"C:\Windows\System32\SHELL32.dll,5"));
        assert_eq!(doc.get("viewstate", "FOLDERTYPE"), Some("Generic"));
        assert_eq!(doc.get("ViewState", "mode"), Some(""));
        assert_eq!(doc.get("ViewState", "missing"), None);
        assert_eq!(doc.get("Missing", "mode"), None);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_replaces_existing_key_in_place
    //
    //  An existing key keeps its position and neighbours keep their text.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn set_replaces_existing_key_in_place() {
        let mut doc = IniDocument::parse(SAMPLE);
        assert!(doc.set(".ShellClassInfo", "IconResource", r"D:\Pics\icon.ico,0"));

        let expected = SAMPLE.replace(
            r"iconresource =C:\Windows\System32\SHELL32.dll,5",
            r"IconResource=D:\Pics\icon.ico,0",
        );
        assert_eq!(doc.to_string(), expected);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_same_value_reports_no_change
    //
    //  A second identical upsert changes nothing.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn set_same_value_reports_no_change() {
        let mut doc = IniDocument::parse(SAMPLE);
        assert!(doc.set(".ShellClassInfo", "IconResource", "x.ico,0"));
        let first = doc.to_string();
        assert!(!doc.set(".ShellClassInfo", "IconResource", "x.ico,0"));
        assert_eq!(doc.to_string(), first);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_new_key_goes_after_last_entry
    //
    //  New keys land before trailing blank lines of their section.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn set_new_key_goes_after_last_entry() {
        let mut doc = IniDocument::parse(SAMPLE);
        doc.set(".ShellClassInfo", "InfoTip", "Photos");

        assert!(doc.to_string().starts_with(
            "[.ShellClassInfo]\r\n\
             iconresource =C:\\Windows\\System32\\SHELL32.dll,5\r\n\
             InfoTip=Photos\r\n\
             \r\n\
             [ViewState]\r\n"
        ));
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_creates_missing_section
    //
    //  Upserting into a missing section appends it.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn set_creates_missing_section() {
        let mut doc = IniDocument::parse("[ViewState]\r\nmode =\r\n");
        doc.set(".ShellClassInfo", "IconResource", "a.ico,0");
        assert_eq!(
            doc.to_string(),
            "[ViewState]\r\nmode =\r\n[.ShellClassInfo]\r\nIconResource=a.ico,0\r\n"
        );
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove_key_and_section
    //
    //  Removing the last key leaves an empty section that can then be
    //  dropped along with its blank lines.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn remove_key_and_section() {
        let mut doc = IniDocument::parse(SAMPLE);

        assert!(doc.remove_key(".ShellClassInfo", "ICONRESOURCE"));
        assert!(doc.has_section(".ShellClassInfo"));
        assert!(!doc.section_has_entries(".ShellClassInfo"));

        assert!(doc.remove_section(".ShellClassInfo"));
        assert_eq!(
            doc.to_string(),
            "[ViewState]\r\nmode =\r\nvid =\r\nfoldertype =Generic\r\n"
        );
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove_missing_key_is_noop
    //
    //  Removing an absent key reports false and changes nothing.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn remove_missing_key_is_noop() {
        let mut doc = IniDocument::parse(SAMPLE);
        assert!(!doc.remove_key("ViewState", "IconResource"));
        assert!(!doc.remove_key("Nope", "IconResource"));
        assert!(!doc.remove_section("Nope"));
        assert_eq!(doc.to_string(), SAMPLE);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  comments_and_preamble_survive
    //
    //  Comments are not entries and text before the first section is kept.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn comments_and_preamble_survive() {
        let text = "; generated\r\n[.ShellClassInfo]\r\n; IconResource=old\r\nIconResource=a.ico,0\r\n";
        let mut doc = IniDocument::parse(text);

        assert_eq!(doc.get(".ShellClassInfo", "IconResource"), Some("a.ico,0"));
        doc.remove_key(".ShellClassInfo", "IconResource");
        assert!(!doc.section_has_entries(".ShellClassInfo"));
        assert_eq!(doc.to_string(), "; generated\r\n[.ShellClassInfo]\r\n; IconResource=old\r\n");
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  lf_input_is_normalized_to_crlf
    //
    //  Unix line endings are accepted and written back as CRLF.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn lf_input_is_normalized_to_crlf() {
        let doc = IniDocument::parse("[A]\nx=1\n");
        assert_eq!(doc.to_string(), "[A]\r\nx=1\r\n");
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  utf16_file_keeps_its_encoding
    //
    //  A UTF-16LE file is read and written back as UTF-16LE.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn utf16_file_keeps_its_encoding() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.ini");

        let mut bytes = vec![0xFF, 0xFE];
        for unit in "[.ShellClassInfo]\r\nIconResource=Ä.ico,0\r\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(&path, &bytes).unwrap();

        let doc = IniDocument::load(&path).unwrap();
        assert_eq!(doc.encoding(), TextEncoding::Utf16Le);
        assert_eq!(doc.get(".ShellClassInfo", "IconResource"), Some("Ä.ico,0"));

        doc.save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }






    ////////////////////////////////////////////////////////////////////////////
    //
    //  ansi_file_round_trips
    //
    //  Code page bytes that are not UTF-8 survive an edit elsewhere in the
    //  file.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn ansi_file_round_trips() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.ini");

        let before = b"[.ShellClassInfo]\r\nInfoTip=Caf\xE9\r\nIconResource=old.ico,0\r\n";
        fs::write(&path, before).unwrap();

        let mut doc = IniDocument::load(&path).unwrap();
        assert_eq!(doc.encoding(), TextEncoding::Ansi);
        assert_eq!(doc.get(".ShellClassInfo", "InfoTip"), Some("Caf\u{E9}"));
        assert_eq!(doc.to_bytes(), before);

        assert!(doc.set(".ShellClassInfo", "IconResource", "new.ico,0"));
        doc.save(&path).unwrap();

        assert_eq!(
            fs::read(&path).unwrap(),
            b"[.ShellClassInfo]\r\nInfoTip=Caf\xE9\r\nIconResource=new.ico,0\r\n"
        );
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  ansi_file_widens_to_utf16
    //
    //  A value outside the code page switches the file to UTF-16LE.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn ansi_file_widens_to_utf16() {
        let mut doc = IniDocument::parse("[.ShellClassInfo]\r\nInfoTip=Caf\u{E9}\r\n");
        doc.encoding = TextEncoding::Ansi;
        doc.set(".ShellClassInfo", "IconResource", "\u{20AC}.ico,0");

        let bytes = doc.to_bytes();
        assert_eq!(&bytes[..2], &UTF16LE_BOM);

        let units: Vec<u16> = bytes[2..].chunks_exact(2).map(|p| u16::from_le_bytes([p[0], p[1]])).collect();
        assert_eq!(
            String::from_utf16(&units).unwrap(),
            "[.ShellClassInfo]\r\nInfoTip=Caf\u{E9}\r\nIconResource=\u{20AC}.ico,0\r\n"
        );
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  utf8_bom_is_kept
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn utf8_bom_is_kept() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.ini");
        fs::write(&path, b"\xEF\xBB\xBF[.ShellClassInfo]\r\nInfoTip=Caf\xC3\xA9\r\n").unwrap();

        let mut doc = IniDocument::load(&path).unwrap();
        assert_eq!(doc.encoding(), TextEncoding::Utf8Bom);
        assert_eq!(doc.section_names().collect::<Vec<_>>(), vec![".ShellClassInfo"]);

        doc.set(".ShellClassInfo", "IconResource", "icon.ico,0");
        doc.save(&path).unwrap();

        assert_eq!(
            fs::read(&path).unwrap(),
            b"\xEF\xBB\xBF[.ShellClassInfo]\r\nInfoTip=Caf\xC3\xA9\r\nIconResource=icon.ico,0\r\n"
        );
    }
}
