//! Implements the command line behavior.

use std::{
    fs::{self, metadata, read_dir},
    path::{Path, PathBuf},
};

use log::{debug, info};
use plcopen_model::{json, Error, Project};
use plcopen_xml::XmlOptions;

/// The wire format of a document file, chosen by its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Xml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Xml,
        }
    }
}

/// Checks that each file (or each file in each directory) is a valid
/// document. Every failure is reported on standard error.
pub fn check(paths: Vec<PathBuf>, suppress_output: bool) -> Result<(), String> {
    let mut files: Vec<PathBuf> = vec![];
    for path in paths {
        files.append(&mut enumerate_files(&path)?);
    }

    let mut errors = 0usize;
    for path in files.iter() {
        match read_project(path) {
            Ok(project) => debug!(
                "{} is valid project '{}'",
                path.display(),
                project.content_header.name
            ),
            Err(err) => {
                if !suppress_output {
                    eprintln!("{}", err);
                }
                errors += 1;
            }
        }
    }

    if errors > 0 {
        return Err(format!("Number of errors: {}", errors));
    }

    if !suppress_output {
        println!("OK");
    }
    Ok(())
}

/// Reads a PLCopen XML document and writes its JSON projection to `output`
/// or to standard output.
pub fn xml2json(input: &Path, output: Option<&Path>, pretty: bool) -> Result<(), String> {
    let text = read_text(input)?;
    let project = plcopen_xml::from_str(&text).map_err(|e| describe(input, &e))?;

    let options = json::JsonOptions { pretty };
    let json = json::to_string_with_options(&project, &options).map_err(|e| describe(input, &e))?;

    write_text(output, &json)
}

/// Reads a JSON document and writes it as PLCopen XML to `output` or to
/// standard output.
pub fn json2xml(input: &Path, output: Option<&Path>, indent: Option<usize>) -> Result<(), String> {
    let text = read_text(input)?;
    let project = json::from_str(&text).map_err(|e| describe(input, &e))?;

    let options = XmlOptions {
        indent,
        ..XmlOptions::default()
    };
    let xml = plcopen_xml::to_string_with_options(&project, &options)
        .map_err(|e| describe(input, &e))?;

    write_text(output, &xml)
}

fn read_project(path: &Path) -> Result<Project, String> {
    let text = read_text(path)?;
    let result = match Format::from_path(path) {
        Format::Xml => plcopen_xml::from_str(&text),
        Format::Json => json::from_str(&text),
    };
    result.map_err(|e| describe(path, &e))
}

/// Formats a document error as `error[code]: file: detail`.
fn describe(path: &Path, err: &Error) -> String {
    format!("error[{}]: {}: {}", err.problem().code(), path.display(), err)
}

fn read_text(path: &Path) -> Result<String, String> {
    info!("Reading {}", path.display());
    fs::read_to_string(path)
        .map_err(|e| format!("error: Failed to read file {}. {}", path.display(), e))
}

fn write_text(output: Option<&Path>, text: &str) -> Result<(), String> {
    match output {
        Some(path) => {
            info!("Writing {}", path.display());
            fs::write(path, text)
                .map_err(|e| format!("error: Failed to write file {}. {}", path.display(), e))
        }
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn enumerate_files(path: &PathBuf) -> Result<Vec<PathBuf>, String> {
    let metadata = metadata(path).map_err(|e| format!("error: {}: {}", path.display(), e))?;
    if metadata.is_dir() {
        let paths = read_dir(path).map_err(|e| e.to_string())?;
        let mut paths: Vec<PathBuf> = paths
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(_) => None,
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        return Ok(paths);
    }
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    Err(format!("error: {}: not a file or directory", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use plcopen_model::{Body, FormattedText, Pou, PouType};
    use plcopen_test::shared_resource_path;
    use tempfile::{tempdir, NamedTempFile};

    use super::*;

    #[test]
    fn check_when_valid_file_then_ok() {
        let paths = vec![shared_resource_path("fbd_and_block.xml")];
        let result = check(paths, true);
        assert!(result.is_ok())
    }

    #[test]
    fn check_when_dangling_reference_then_error() {
        let paths = vec![shared_resource_path("dangling_reference.xml")];
        let result = check(paths, true);
        assert_eq!(result.unwrap_err(), "Number of errors: 1");
    }

    #[test]
    fn check_when_dir_then_checks_each_file() {
        let dir = tempdir().unwrap();
        fs::copy(
            shared_resource_path("array_2d.xml"),
            dir.path().join("a.xml"),
        )
        .unwrap();
        fs::copy(
            shared_resource_path("duplicate_variable.xml"),
            dir.path().join("b.xml"),
        )
        .unwrap();
        fs::copy(
            shared_resource_path("dangling_reference.xml"),
            dir.path().join("c.xml"),
        )
        .unwrap();

        let result = check(vec![dir.path().to_path_buf()], true);
        assert_eq!(result.unwrap_err(), "Number of errors: 2");
    }

    #[test]
    fn check_when_missing_path_then_error() {
        let result = check(vec![PathBuf::from("does/not/exist.xml")], true);
        assert!(result.unwrap_err().starts_with("error: "));
    }

    #[test]
    fn xml2json_when_valid_then_json2xml_restores_project() {
        let input = shared_resource_path("full_project.xml");
        let json_file = NamedTempFile::with_suffix(".json").unwrap();
        let xml_file = NamedTempFile::with_suffix(".xml").unwrap();

        xml2json(&input, Some(json_file.path()), false).unwrap();
        json2xml(json_file.path(), Some(xml_file.path()), Some(2)).unwrap();

        let original = plcopen_xml::from_str(&fs::read_to_string(&input).unwrap()).unwrap();
        let restored =
            plcopen_xml::from_str(&fs::read_to_string(xml_file.path()).unwrap()).unwrap();
        assert_eq!(restored, original);

        assert!(check(vec![json_file.path().to_path_buf()], true).is_ok());
    }

    #[test]
    fn xml2json_when_invalid_then_error_names_problem() {
        let input = shared_resource_path("duplicate_variable.xml");
        let err = xml2json(&input, None, false).unwrap_err();
        assert!(err.starts_with("error[P0008]: "));
    }

    #[test]
    fn json2xml_when_st_is_plain_text_then_error_and_no_output() {
        let mut project = plcopen_xml::from_str(&plcopen_test::read_shared_resource(
            "fbd_and_block.xml",
        ))
        .unwrap();
        let mut pou = Pou::new("Plain", PouType::Program);
        pou.body = Some(Body::St(FormattedText::from_markup(
            "IF a < b THEN x := 1; END_IF;",
        )));
        project.types_mut().pous.push(pou);

        let json_file = NamedTempFile::with_suffix(".json").unwrap();
        fs::write(json_file.path(), json::to_string(&project).unwrap()).unwrap();
        let dir = tempdir().unwrap();
        let xml_path = dir.path().join("out.xml");

        let err = json2xml(json_file.path(), Some(&xml_path), Some(2)).unwrap_err();
        assert!(err.starts_with("error[P0012]: "), "{}", err);
        assert!(err.contains("<ST>"));
        assert!(!xml_path.exists());
    }

    #[test]
    fn from_path_when_json_extension_then_json() {
        assert_eq!(Format::from_path(Path::new("a/b.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.xml")), Format::Xml);
        assert_eq!(Format::from_path(Path::new("a/b")), Format::Xml);
    }
}
