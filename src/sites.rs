use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::point::Site;

#[derive(Debug, Error)]
pub enum SiteFileError {
    #[error("cannot open site file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("site file {path} has no parsed data")]
    Empty { path: String },
}

/// Reads a site file of the form `( x , y ),( x , y ),…`, punctuation
/// and whitespace tolerated. Sites get dense 1-based labels in file
/// order.
pub fn parse_sites(path: &str) -> Result<Vec<Site>, SiteFileError> {
    let content = std::fs::read_to_string(Path::new(path)).map_err(|source| {
        SiteFileError::Unreadable { path: path.to_string(), source }
    })?;

    let sites = parse_site_list(&content);
    if sites.is_empty() {
        return Err(SiteFileError::Empty { path: path.to_string() });
    }
    debug!("parsed {} sites from {}", sites.len(), path);
    Ok(sites)
}

/// Pulls coordinate pairs out of free-form text: anything that is not
/// part of a number separates tokens, and tokens pair up as (x, y).
pub fn parse_site_list(text: &str) -> Vec<Site> {
    let numbers: Vec<f64> = text
        .split(|c: char| !(c.is_ascii_digit() || "+-.eE".contains(c)))
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<f64>().ok())
        .collect();

    numbers
        .chunks_exact(2)
        .enumerate()
        .map(|(i, xy)| Site::new(xy[0], xy[1], i as i64 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::soft_eq;

    #[test]
    fn parses_the_reference_format() {
        let sites = parse_site_list("( 1.5 , 2 ),( -3 , 4.25 ),( 0 , 0 )");
        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].id, 1);
        assert!(soft_eq(sites[0].x(), 1.5));
        assert!(soft_eq(sites[1].x(), -3.0));
        assert!(soft_eq(sites[1].y(), 4.25));
        assert_eq!(sites[2].id, 3);
    }

    #[test]
    fn tolerates_loose_punctuation_and_newlines() {
        let sites = parse_site_list("(1,2)\n( 3 ,4 ) , (5e-1, -6.0)");
        assert_eq!(sites.len(), 3);
        assert!(soft_eq(sites[2].x(), 0.5));
        assert!(soft_eq(sites[2].y(), -6.0));
    }

    #[test]
    fn odd_trailing_number_is_dropped() {
        let sites = parse_site_list("(1, 2), (3");
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(parse_site_list("").is_empty());
        assert!(parse_site_list("no numbers here").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = parse_sites("/definitely/not/a/real/file.txt").unwrap_err();
        assert!(matches!(err, SiteFileError::Unreadable { .. }));
    }
}
