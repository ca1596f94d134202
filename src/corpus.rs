//! Grouped analogy corpora in the format of the Mikolov et al. (2013)
//! question set:
//!
//! ```text
//! : capital-common-countries
//! Athens Greece Baghdad Iraq
//! Athens Greece Bangkok Thailand
//! : family
//! boy girl brother sister
//! ```
//!
//! A line starting with `:` opens a group, every other non-blank line is a
//! 4-word question `a b c expected` read as "a is to b as c is to expected".
use crate::error::{CorpusError, GroupNotFound, MalformedTuple};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Prefix of a group header line.
pub const GROUP_MARKER: char = ':';

/// One analogy question. Words are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalogyTuple {
    pub a: String,
    pub b: String,
    pub c: String,
    pub expected: String,
}

impl AnalogyTuple {
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        AnalogyTuple {
            a: a.into(),
            b: b.into(),
            c: c.into(),
            expected: expected.into(),
        }
    }

    /// Build a tuple from exactly four tokens.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, MalformedTuple> {
        match tokens {
            [a, b, c, d] => Ok(AnalogyTuple::new(
                a.as_ref(),
                b.as_ref(),
                c.as_ref(),
                d.as_ref(),
            )),
            _ => Err(MalformedTuple {
                tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            }),
        }
    }

    pub fn words(&self) -> [&str; 4] {
        [&self.a, &self.b, &self.c, &self.expected]
    }
}

impl FromStr for AnalogyTuple {
    type Err = MalformedTuple;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        AnalogyTuple::from_tokens(&tokens)
    }
}

/// A named run of analogy questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogyGroup {
    name: String,
    tuples: Vec<AnalogyTuple>,
}

impl AnalogyGroup {
    pub fn new(name: impl Into<String>, tuples: Vec<AnalogyTuple>) -> Self {
        AnalogyGroup {
            name: name.into(),
            tuples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuples(&self) -> &[AnalogyTuple] {
        &self.tuples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalogyTuple> {
        self.tuples.iter()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl<'a> IntoIterator for &'a AnalogyGroup {
    type Item = &'a AnalogyTuple;
    type IntoIter = std::slice::Iter<'a, AnalogyTuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.iter()
    }
}

/// A data line that was skipped because it did not hold four words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the source
    pub line: usize,
    pub tokens: Vec<String>,
}

/// Parsed analogy corpus. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalogyCorpus {
    groups: Vec<AnalogyGroup>,
    index: HashMap<String, usize>, // group name to position in `groups`
    malformed: Vec<MalformedLine>,
    orphans: usize, // data lines seen outside any group
}

impl AnalogyCorpus {
    /// Parse a whole corpus. Malformed lines never fail the parse: they are
    /// logged, recorded and skipped. Only I/O errors are returned.
    pub fn parse<R: BufRead>(reader: R) -> Result<AnalogyCorpus, CorpusError> {
        let mut corpus = AnalogyCorpus::default();
        let mut open_group = None;
        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            corpus.push_line(index + 1, &line, &mut open_group);
        }
        corpus.log_summary();
        Ok(corpus)
    }

    pub fn parse_str(source: &str) -> AnalogyCorpus {
        let mut corpus = AnalogyCorpus::default();
        let mut open_group = None;
        for (index, line) in source.lines().enumerate() {
            corpus.push_line(index + 1, line, &mut open_group);
        }
        corpus.log_summary();
        corpus
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AnalogyCorpus, CorpusError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CorpusError::NotFound {
                path: path.to_path_buf(),
            },
            _ => CorpusError::Io(e),
        })?;
        info!("Reading analogies from {}", path.display());
        AnalogyCorpus::parse(BufReader::new(file))
    }

    fn push_line(&mut self, line_no: usize, line: &str, open_group: &mut Option<usize>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(rest) = line.strip_prefix(GROUP_MARKER) {
            let name = rest.trim();
            if name.is_empty() {
                warn!("line {line_no}: group header without a name, skipping");
                self.malformed.push(MalformedLine {
                    line: line_no,
                    tokens: vec![line.to_string()],
                });
                *open_group = None;
            } else {
                *open_group = Some(self.open_group(name));
            }
            return;
        }

        let Some(pos) = *open_group else {
            debug!("line {line_no}: data line outside of any group, discarding");
            self.orphans += 1;
            return;
        };

        match line.parse::<AnalogyTuple>() {
            Ok(tuple) => self.groups[pos].tuples.push(tuple),
            Err(MalformedTuple { tokens }) => {
                warn!(
                    "line {line_no}: expected 4 words, got {}, skipping '{line}'",
                    tokens.len()
                );
                self.malformed.push(MalformedLine {
                    line: line_no,
                    tokens,
                });
            }
        }
    }

    // A repeated header continues the earlier group of the same name.
    fn open_group(&mut self, name: &str) -> usize {
        if let Some(&pos) = self.index.get(name) {
            warn!("group '{name}' appears more than once, merging");
            return pos;
        }
        let pos = self.groups.len();
        self.groups.push(AnalogyGroup::new(name, Vec::new()));
        self.index.insert(name.to_string(), pos);
        pos
    }

    fn log_summary(&self) {
        debug!(
            "parsed {} groups, {} questions, {} malformed lines, {} orphan lines",
            self.groups.len(),
            self.tuple_count(),
            self.malformed.len(),
            self.orphans
        );
    }

    /// Exact, case-sensitive lookup by group name.
    pub fn select_group(&self, name: &str) -> Result<&AnalogyGroup, GroupNotFound> {
        self.index
            .get(name)
            .map(|&pos| &self.groups[pos])
            .ok_or_else(|| GroupNotFound {
                name: name.to_string(),
            })
    }

    /// Group names in file order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(AnalogyGroup::name)
    }

    pub fn groups(&self) -> &[AnalogyGroup] {
        &self.groups
    }

    /// 0-based positional access, as used by menu-style selection.
    pub fn get(&self, index: usize) -> Option<&AnalogyGroup> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn tuple_count(&self) -> usize {
        self.groups.iter().map(AnalogyGroup::len).sum()
    }

    pub fn malformed_lines(&self) -> &[MalformedLine] {
        &self.malformed
    }

    pub fn orphan_lines(&self) -> usize {
        self.orphans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
: capital-common-countries
Athens Greece Baghdad Iraq
Athens Greece Bangkok Thailand

: family
boy girl brother sister
boy girl king queen
: empty
: gram2-opposite
acceptable unacceptable aware unaware
";

    fn tuple(a: &str, b: &str, c: &str, d: &str) -> AnalogyTuple {
        AnalogyTuple::new(a, b, c, d)
    }

    #[test]
    fn sample_group_holds_its_lines_in_order() {
        let corpus = AnalogyCorpus::parse_str(": sample\na b c d\ne f g h\n");
        let group = corpus.select_group("sample").unwrap();
        assert_eq!(
            group.tuples(),
            &[tuple("a", "b", "c", "d"), tuple("e", "f", "g", "h")]
        );
    }

    #[test]
    fn groups_are_split_at_markers() {
        let corpus = AnalogyCorpus::parse_str(SAMPLE);
        let names: Vec<&str> = corpus.group_names().collect();
        assert_eq!(
            names,
            ["capital-common-countries", "family", "empty", "gram2-opposite"]
        );

        let family = corpus.select_group("family").unwrap();
        assert_eq!(
            family.tuples(),
            &[
                tuple("boy", "girl", "brother", "sister"),
                tuple("boy", "girl", "king", "queen"),
            ]
        );
        assert!(corpus.select_group("empty").unwrap().is_empty());
        assert_eq!(corpus.get(3).unwrap().name(), "gram2-opposite");
        assert_eq!(corpus.tuple_count(), 5);
    }

    #[test]
    fn reader_and_str_parse_agree() {
        let from_reader = AnalogyCorpus::parse(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(from_reader, AnalogyCorpus::parse_str(SAMPLE));
        assert_eq!(AnalogyCorpus::parse_str(SAMPLE), AnalogyCorpus::parse_str(SAMPLE));
    }

    #[test]
    fn empty_source_has_no_groups() {
        let corpus = AnalogyCorpus::parse_str("");
        assert!(corpus.is_empty());
        assert_eq!(corpus.group_names().count(), 0);
    }

    #[test]
    fn short_and_long_lines_are_skipped() {
        let corpus = AnalogyCorpus::parse_str(": g\na b c\nw x y z\nq r s t u\n");
        let group = corpus.select_group("g").unwrap();
        assert_eq!(group.tuples(), &[tuple("w", "x", "y", "z")]);
        assert_eq!(
            corpus.malformed_lines(),
            &[
                MalformedLine {
                    line: 2,
                    tokens: vec!["a".into(), "b".into(), "c".into()],
                },
                MalformedLine {
                    line: 4,
                    tokens: vec!["q".into(), "r".into(), "s".into(), "t".into(), "u".into()],
                },
            ]
        );
    }

    #[test]
    fn lines_before_first_marker_are_discarded() {
        let corpus = AnalogyCorpus::parse_str("a b c d\ne f g h\n: g\ni j k l\n");
        assert_eq!(corpus.orphan_lines(), 2);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.select_group("g").unwrap().len(), 1);
    }

    #[test]
    fn nameless_marker_orphans_following_lines() {
        let corpus = AnalogyCorpus::parse_str(": g\na b c d\n:\ne f g h\n");
        assert_eq!(corpus.select_group("g").unwrap().len(), 1);
        assert_eq!(corpus.orphan_lines(), 1);
        assert_eq!(corpus.malformed_lines().len(), 1);
    }

    #[test]
    fn marker_without_space_is_accepted() {
        let corpus = AnalogyCorpus::parse_str(":currency\nAlgeria dinar Angola kwanza\n");
        assert_eq!(corpus.select_group("currency").unwrap().len(), 1);
    }

    #[test]
    fn repeated_marker_merges_into_first_group() {
        let corpus = AnalogyCorpus::parse_str(": g\na b c d\n: h\ne f g h\n: g\ni j k l\n");
        assert_eq!(corpus.len(), 2);
        let g = corpus.select_group("g").unwrap();
        assert_eq!(
            g.tuples(),
            &[tuple("a", "b", "c", "d"), tuple("i", "j", "k", "l")]
        );
    }

    #[test]
    fn missing_group_leaves_corpus_usable() {
        let corpus = AnalogyCorpus::parse_str(SAMPLE);
        let before = corpus.clone();
        let err = corpus.select_group("Family").unwrap_err();
        assert_eq!(err.name, "Family");
        assert_eq!(corpus, before);
        assert_eq!(corpus.select_group("family").unwrap().len(), 2);
    }

    #[test]
    fn tuple_requires_four_tokens() {
        assert!("a b c".parse::<AnalogyTuple>().is_err());
        assert!("".parse::<AnalogyTuple>().is_err());
        let t: AnalogyTuple = "  Paris\tFrance  Rome Italy ".parse().unwrap();
        assert_eq!(t.words(), ["Paris", "France", "Rome", "Italy"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalogyCorpus::from_file("no/such/analogies.txt").unwrap_err();
        assert!(matches!(err, CorpusError::NotFound { .. }));
        assert!(err.to_string().contains("no/such/analogies.txt"));
    }

    #[test]
    fn reads_corpus_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, SAMPLE.as_bytes()).unwrap();
        let corpus = AnalogyCorpus::from_file(file.path()).unwrap();
        assert_eq!(corpus, AnalogyCorpus::parse_str(SAMPLE));
    }
}
