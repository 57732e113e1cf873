//! Readers for the three tab-delimited identifier formats.
//!
//! All readers are lazy iterators over a [`BufRead`]. A row whose column count
//! does not match the header aborts the read with [`IdMergeError::MalformedRow`].

use std::io::{BufRead, Lines};

use crate::domain::{EntityId, sources};
use crate::error::IdMergeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRecord {
    pub id: EntityId,
    pub biotype: String,
    pub description: String,
    /// `(symbol, source)` pairs in header order.
    pub symbols: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseRecord {
    pub entrez_id: String,
    pub name: String,
    pub xrefs: String,
    pub biotype: String,
}

impl ReverseRecord {
    /// Identifiers from the `Source:ID|Source:ID` cross-reference cell that
    /// belong to `wanted_source`. Entries not of the exact form `Source:ID`
    /// are skipped.
    pub fn xrefs(&self, wanted_source: &str) -> Vec<&str> {
        self.xrefs
            .split('|')
            .filter_map(|part| {
                let mut pieces = part.split(':');
                match (pieces.next(), pieces.next(), pieces.next()) {
                    (Some(source), Some(ident), None) if source == wanted_source => Some(ident),
                    _ => None,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripletRecord {
    pub id: EntityId,
    pub symbol: String,
    pub source: String,
}

struct TabLines<R> {
    lines: Lines<R>,
    origin: String,
    line_no: usize,
}

impl<R: BufRead> TabLines<R> {
    fn new(reader: R, origin: String) -> Self {
        Self {
            lines: reader.lines(),
            origin,
            line_no: 0,
        }
    }

    /// Next non-blank line with the line terminator removed.
    fn next_line(&mut self) -> Option<Result<String, IdMergeError>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    return Some(Err(IdMergeError::Filesystem(format!(
                        "{}: {err}",
                        self.origin
                    ))));
                }
            };
            self.line_no += 1;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            return Some(Ok(line.to_string()));
        }
    }

    fn fields<'a>(&self, line: &'a str, expected: usize) -> Result<Vec<&'a str>, IdMergeError> {
        let fields = line.split('\t').collect::<Vec<_>>();
        if fields.len() != expected {
            return Err(IdMergeError::MalformedRow {
                origin: self.origin.clone(),
                line: self.line_no,
                expected,
                found: fields.len(),
            });
        }
        Ok(fields)
    }

    fn header(&mut self) -> Result<Vec<String>, IdMergeError> {
        match self.next_line() {
            Some(line) => Ok(line?
                .split('\t')
                .map(|field| field.trim().to_string())
                .collect()),
            None => Err(IdMergeError::MissingHeader {
                origin: self.origin.clone(),
            }),
        }
    }
}

fn column(header: &[String], name: &str, origin: &str) -> Result<usize, IdMergeError> {
    header
        .iter()
        .position(|field| field == name)
        .ok_or_else(|| IdMergeError::MissingColumn {
            origin: origin.to_string(),
            column: name.to_string(),
        })
}

/// Wide multi-source records: one row per entity, one column per source.
pub struct WideReader<R> {
    inner: TabLines<R>,
    header: Vec<String>,
    id_col: usize,
    biotype_col: usize,
    description_col: usize,
}

impl<R: BufRead> WideReader<R> {
    pub fn new(reader: R, origin: impl Into<String>) -> Result<Self, IdMergeError> {
        let mut inner = TabLines::new(reader, origin.into());
        let header = inner.header()?;
        let id_col = column(&header, sources::GMID, &inner.origin)?;
        let biotype_col = column(&header, sources::BIOTYPE, &inner.origin)?;
        let description_col = column(&header, sources::DEFINITION, &inner.origin)?;
        Ok(Self {
            inner,
            header,
            id_col,
            biotype_col,
            description_col,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn parse(&self, line: &str) -> Result<WideRecord, IdMergeError> {
        let fields = self.inner.fields(line, self.header.len())?;
        let id = fields[self.id_col].parse::<EntityId>()?;

        let mut symbols = Vec::new();
        for (idx, (source, value)) in self.header.iter().zip(&fields).enumerate() {
            if idx == self.id_col || idx == self.biotype_col || idx == self.description_col {
                continue;
            }
            let value = value.trim();
            if sources::NON_DELIMITED.contains(&source.as_str()) {
                symbols.push((value.to_string(), source.clone()));
            } else {
                symbols.extend(
                    value
                        .split(';')
                        .map(|symbol| (symbol.to_string(), source.clone())),
                );
            }
        }

        Ok(WideRecord {
            id,
            biotype: fields[self.biotype_col].trim().to_string(),
            description: fields[self.description_col].trim().to_string(),
            symbols,
        })
    }
}

impl<R: BufRead> Iterator for WideReader<R> {
    type Item = Result<WideRecord, IdMergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.inner.next_line()?;
        Some(line.and_then(|line| self.parse(&line)))
    }
}

/// Entrez gene info records carrying the reverse cross-references.
pub struct ReverseReader<R> {
    inner: TabLines<R>,
    width: usize,
    entrez_col: usize,
    name_col: usize,
    xrefs_col: usize,
    biotype_col: usize,
}

impl<R: BufRead> ReverseReader<R> {
    pub fn new(reader: R, origin: impl Into<String>) -> Result<Self, IdMergeError> {
        let mut inner = TabLines::new(reader, origin.into());
        let header = inner.header()?;
        Ok(Self {
            entrez_col: column(&header, sources::REV_ENTREZ_ID, &inner.origin)?,
            name_col: column(&header, sources::REV_GENE_NAME, &inner.origin)?,
            xrefs_col: column(&header, sources::REV_XREFS, &inner.origin)?,
            biotype_col: column(&header, sources::REV_BIOTYPE, &inner.origin)?,
            width: header.len(),
            inner,
        })
    }

    fn parse(&self, line: &str) -> Result<ReverseRecord, IdMergeError> {
        let line = line.replace('\r', " ");
        let fields = self.inner.fields(&line, self.width)?;
        Ok(ReverseRecord {
            entrez_id: fields[self.entrez_col].trim().to_string(),
            name: fields[self.name_col].trim().to_string(),
            xrefs: fields[self.xrefs_col].trim().to_string(),
            biotype: fields[self.biotype_col].trim().to_string(),
        })
    }
}

impl<R: BufRead> Iterator for ReverseReader<R> {
    type Item = Result<ReverseRecord, IdMergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.inner.next_line()?;
        Some(line.and_then(|line| self.parse(&line)))
    }
}

/// Headerless `id<TAB>symbol<TAB>source` rows.
pub struct TripletReader<R> {
    inner: TabLines<R>,
}

impl<R: BufRead> TripletReader<R> {
    pub fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            inner: TabLines::new(reader, origin.into()),
        }
    }

    fn parse(&self, line: &str) -> Result<TripletRecord, IdMergeError> {
        let fields = self.inner.fields(line, 3)?;
        Ok(TripletRecord {
            id: fields[0].parse()?,
            symbol: fields[1].to_string(),
            source: fields[2].to_string(),
        })
    }
}

impl<R: BufRead> Iterator for TripletReader<R> {
    type Item = Result<TripletRecord, IdMergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.inner.next_line()?;
        Some(line.and_then(|line| self.parse(&line)))
    }
}
