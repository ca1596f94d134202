use crate::error::{EmbeddingLoadError, LookupError};
use crate::lookup::{EmbeddingLookup, Neighbours};
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const EPS: f64 = 1e-8;

/// Largest vector dimension accepted from a file header.
pub const MAX_DIMS: usize = 1 << 16;

/// On-disk layout of an embedding file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingFormat {
    /// `"<count> <dims>"` header followed by one `word v1 .. vn` line per word
    Word2VecText,
    /// same header, then `word ` followed by `dims` little-endian f32 per word
    Word2VecBinary,
    /// like Word2VecText but without the header line. The binaries convert
    /// GloVe files to Word2VecText first and only read this layout directly
    /// when the converted copy cannot be written.
    Glove,
}

impl EmbeddingFormat {
    /// `.bin` files are binary word2vec, anything else is text.
    pub fn from_path(path: &Path) -> EmbeddingFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => EmbeddingFormat::Word2VecBinary,
            _ => EmbeddingFormat::Word2VecText,
        }
    }
}

// A struct to hold word vectors in a contiguous array for performance.
pub struct WordVectors {
    words: Vec<String>,               // vocabulary - index to word map
    word_map: HashMap<String, usize>, // word to index map
    vectors: Vec<f64>,                // A single, flattened Vec of all unit vectors
    dims: usize,                      // The dimension of each vector
}

impl WordVectors {
    pub fn get_word(&self, idx: usize) -> &str {
        &self.words[idx]
    }

    pub fn get_index(&self, word: &str) -> Option<usize> {
        self.word_map.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_map.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    fn get_vector(&self, idx: usize) -> &[f64] {
        &self.vectors[idx * self.dims..(idx + 1) * self.dims]
    }

    /// Load an embedding file. Vectors are normalised to unit length.
    pub fn load<P: AsRef<Path>>(
        path: P,
        format: EmbeddingFormat,
    ) -> Result<WordVectors, EmbeddingLoadError> {
        let path = path.as_ref();
        info!(
            "Initializing embedding from file {} ({format:?}). Please wait, this may take a while.",
            path.display()
        );
        let reader = BufReader::new(File::open(path)?);
        let word_vectors = match format {
            EmbeddingFormat::Word2VecText => WordVectors::from_word2vec_text(reader)?,
            EmbeddingFormat::Word2VecBinary => WordVectors::from_word2vec_binary(reader)?,
            EmbeddingFormat::Glove => WordVectors::from_glove_text(reader)?,
        };
        info!(
            "Embedding loaded successfully: {} words, {} dimensions",
            word_vectors.len(),
            word_vectors.dims()
        );
        Ok(word_vectors)
    }

    /// Headerless text vectors, the dimension is taken from the first line.
    pub fn from_glove_text<R: BufRead>(reader: R) -> Result<WordVectors, EmbeddingLoadError> {
        let mut builder = Builder::new(None);
        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if let Some((word, values)) = parse_text_line(&line, index + 1)? {
                builder.push(word, values, index + 1)?;
            }
        }
        builder.finish()
    }

    pub fn from_word2vec_text<R: BufRead>(reader: R) -> Result<WordVectors, EmbeddingLoadError> {
        let mut lines = reader.lines().enumerate();
        let (count, dims) = loop {
            let Some((index, line_result)) = lines.next() else {
                return Err(EmbeddingLoadError::Empty);
            };
            let line = line_result?;
            if !line.trim().is_empty() {
                break parse_header(&line, index + 1)?;
            }
        };

        let mut builder = Builder::new(Some(dims));
        let mut seen = 0;
        for (index, line_result) in lines {
            let line = line_result?;
            let Some((word, values)) = parse_text_line(&line, index + 1)? else {
                continue;
            };
            if seen == count {
                warn!("ignoring vectors after the {count} declared in the header");
                break;
            }
            builder.push(word, values, index + 1)?;
            seen += 1;
        }
        if seen < count {
            return Err(EmbeddingLoadError::Format(format!(
                "header declares {count} vectors but the file holds {seen}"
            )));
        }
        builder.finish()
    }

    pub fn from_word2vec_binary<R: BufRead>(
        mut reader: R,
    ) -> Result<WordVectors, EmbeddingLoadError> {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            return Err(EmbeddingLoadError::Empty);
        }
        let (count, dims) = parse_header(&header, 1)?;

        let mut builder = Builder::new(Some(dims));
        let mut word_buf = Vec::new();
        let mut values = vec![0f32; dims];
        for n in 0..count {
            word_buf.clear();
            if reader.read_until(b' ', &mut word_buf)? == 0 {
                return Err(EmbeddingLoadError::Format(format!(
                    "header declares {count} vectors but the file holds {n}"
                )));
            }
            // the previous vector may be followed by a newline
            let word_bytes = word_buf.strip_suffix(b" ").ok_or_else(|| {
                EmbeddingLoadError::Format(format!("truncated word at entry {n}"))
            })?;
            let word = String::from_utf8_lossy(word_bytes.trim_ascii_start()).into_owned();

            reader.read_f32_into::<LittleEndian>(&mut values)?;
            builder.push(&word, values.iter().map(|&v| v as f64).collect(), n + 2)?;
        }
        builder.finish()
    }

    /// Build a model from in-memory vectors.
    pub fn from_pairs<I, S>(pairs: I) -> Result<WordVectors, EmbeddingLoadError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let mut builder = Builder::new(None);
        for (index, (word, values)) in pairs.into_iter().enumerate() {
            builder.push(word.as_ref(), values, index + 1)?;
        }
        builder.finish()
    }

    /// Top `n` vocabulary entries by dot product with a unit `target`.
    fn nearest(&self, target: &[f64], exclude: &HashSet<usize>, n: usize) -> Vec<(usize, f64)> {
        // Collect all scores in parallel
        let mut scores: Vec<(usize, f64)> = self
            .vectors
            .par_chunks_exact(self.dims)
            .enumerate()
            .filter(|(i, _)| !exclude.contains(i)) // Exclude all input words
            .map(|(i, v_slice)| {
                let score = v_slice.iter().zip(target).map(|(v, t)| v * t).sum::<f64>();
                (i, score)
            })
            .collect();

        // Descending score, vocabulary order breaks ties.
        let by_score =
            |a: &(usize, f64), b: &(usize, f64)| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0));

        // Partial sort first, this is faster when n is small compared to scores.len().
        if n < scores.len() {
            scores.select_nth_unstable_by(n, by_score);
            scores.truncate(n);
        }
        scores.sort_by(by_score);
        scores
    }
}

impl EmbeddingLookup for WordVectors {
    fn most_similar(
        &self,
        positive: &[&str],
        negative: &[&str],
        top_k: usize,
    ) -> Result<Neighbours, LookupError> {
        let terms = positive
            .iter()
            .map(|w| (*w, 1.0))
            .chain(negative.iter().map(|w| (*w, -1.0)));

        let mut exclude = HashSet::new();
        let mut target_vector = vec![0.0; self.dims];
        for (word, weight) in terms {
            let idx = self
                .get_index(word)
                .ok_or_else(|| LookupError::OutOfVocabulary {
                    word: word.to_string(),
                })?;
            exclude.insert(idx);
            for (t, v) in target_vector.iter_mut().zip(self.get_vector(idx)) {
                *t += weight * v;
            }
        }

        // Normalize the target vector for cosine similarity
        let magnitude: f64 = target_vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if exclude.is_empty() || magnitude < EPS {
            return Err(LookupError::NoVectors);
        }
        target_vector.iter_mut().for_each(|e| *e /= magnitude);

        if top_k == 0 {
            return Ok(Vec::new());
        }

        Ok(self
            .nearest(&target_vector, &exclude, top_k)
            .into_iter()
            .map(|(i, score)| (self.words[i].clone(), score))
            .collect())
    }
}

// Accumulates vectors while a file is parsed.
struct Builder {
    words: Vec<String>,
    word_map: HashMap<String, usize>,
    vectors: Vec<f64>,
    dims: Option<usize>,
}

impl Builder {
    fn new(dims: Option<usize>) -> Builder {
        Builder {
            words: Vec::new(),
            word_map: HashMap::new(),
            vectors: Vec::new(),
            dims,
        }
    }

    fn push(
        &mut self,
        word: &str,
        mut values: Vec<f64>,
        line: usize,
    ) -> Result<(), EmbeddingLoadError> {
        match self.dims {
            None => {
                // Determine dimensions from the first vector
                if values.is_empty() {
                    return Err(EmbeddingLoadError::Format(
                        "First vector has zero dimensions, cannot proceed.".into(),
                    ));
                }
                self.dims = Some(values.len());
            }
            Some(dims) if values.len() != dims => {
                return Err(EmbeddingLoadError::Parse {
                    line,
                    message: format!(
                        "Vector for '{word}' has dimension {} which differs from dimension {dims}",
                        values.len()
                    ),
                });
            }
            Some(_) => {}
        }

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(EmbeddingLoadError::Parse {
                line,
                message: format!("Vector for '{word}' holds non-finite value {bad}"),
            });
        }

        if self.word_map.contains_key(word) {
            debug!("line {line}: duplicate vector for '{word}', keeping the first");
            return Ok(());
        }

        let norm: f64 = values.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > EPS {
            values.iter_mut().for_each(|e| *e /= norm);
        }

        self.word_map.insert(word.to_string(), self.words.len());
        self.words.push(word.to_string());
        self.vectors.extend_from_slice(&values);
        Ok(())
    }

    fn finish(self) -> Result<WordVectors, EmbeddingLoadError> {
        match self.dims {
            Some(dims) if dims > 0 && !self.words.is_empty() => Ok(WordVectors {
                words: self.words,
                word_map: self.word_map,
                vectors: self.vectors,
                dims,
            }),
            Some(0) => Err(EmbeddingLoadError::Format(
                "header declares zero dimensions, cannot proceed.".into(),
            )),
            _ => Err(EmbeddingLoadError::Empty),
        }
    }
}

fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize), EmbeddingLoadError> {
    let mut parts = line.split_whitespace().map(str::parse::<usize>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(count)), Some(Ok(dims)), None) => {
            if dims > MAX_DIMS || count.checked_mul(dims).is_none() {
                return Err(EmbeddingLoadError::Format(format!(
                    "header declares {count} vectors of {dims} dimensions, at most {MAX_DIMS} dimensions are supported"
                )));
            }
            Ok((count, dims))
        }
        _ => Err(EmbeddingLoadError::Parse {
            line: line_no,
            message: format!("expected a '<count> <dims>' header, got '{}'", line.trim()),
        }),
    }
}

fn parse_text_line(
    line: &str,
    line_no: usize,
) -> Result<Option<(&str, Vec<f64>)>, EmbeddingLoadError> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let values = parts
        .map(|s| s.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| EmbeddingLoadError::Parse {
            line: line_no,
            message: format!("bad value in vector for '{word}': {e}"),
        })?;
    Ok(Some((word, values)))
}

/// Path of the word2vec copy of a GloVe file: `glove.6B.300d.txt` becomes
/// `glove.6B.300d.w2v.txt`.
pub fn word2vec_path_for(glove_path: &Path) -> PathBuf {
    let mut name = OsString::from(glove_path.file_stem().unwrap_or_default());
    name.push(".w2v");
    if let Some(ext) = glove_path.extension() {
        name.push(".");
        name.push(ext);
    }
    glove_path.with_file_name(name)
}

/// Write `dst` as `src` with a word2vec `"<count> <dims>"` header prepended.
/// Returns `(count, dims)`. The copy is written to a temporary file and moved
/// into place, so `dst` is never left half written.
pub fn glove_to_word2vec(src: &Path, dst: &Path) -> Result<(usize, usize), EmbeddingLoadError> {
    let mut count = 0;
    let mut dims = 0;
    for line_result in BufReader::new(File::open(src)?).lines() {
        let line = line_result?;
        let tokens = line.split_whitespace().count();
        if tokens == 0 {
            continue;
        }
        if count == 0 {
            dims = tokens - 1;
        }
        count += 1;
    }
    if count == 0 {
        return Err(EmbeddingLoadError::Empty);
    }

    info!(
        "Converting {} to word2vec format in {} ({count} vectors, {dims} dimensions)",
        src.display(),
        dst.display()
    );
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut f_out = BufWriter::new(tmp.as_file_mut());
        writeln!(f_out, "{count} {dims}")?;
        for line_result in BufReader::new(File::open(src)?).lines() {
            let line = line_result?;
            if !line.trim().is_empty() {
                writeln!(f_out, "{line}")?;
            }
        }
        f_out.flush()?;
    }
    tmp.persist(dst).map_err(|e| e.error)?;
    Ok((count, dims))
}

/// True when `dst` is a regular file modified after `src`.
pub fn is_newer(dst: &Path, src: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());
    match (fs::metadata(dst), modified(dst), modified(src)) {
        (Ok(meta), Ok(dst_time), Ok(src_time)) => meta.is_file() && dst_time > src_time,
        _ => false,
    }
}
