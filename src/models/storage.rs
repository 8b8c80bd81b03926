// src/models/storage.rs

use crate::common::error::AppError;

// Um arquivo pode viver fora do banco (caminho) ou dentro dele (bytes).
// No esquema isso vira o par de colunas `*_path` / `*_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredFile {
    Reference(String),
    Inline(Vec<u8>),
}

impl StoredFile {
    /// Reconstrói a partir das colunas. Se as duas estiverem preenchidas,
    /// os bytes inline têm prioridade.
    pub fn from_columns(path: Option<String>, data: Option<Vec<u8>>) -> Option<Self> {
        match (path, data) {
            (_, Some(bytes)) => Some(StoredFile::Inline(bytes)),
            (Some(path), None) => Some(StoredFile::Reference(path)),
            (None, None) => None,
        }
    }

    pub fn into_columns(self) -> (Option<String>, Option<Vec<u8>>) {
        match self {
            StoredFile::Reference(path) => (Some(path), None),
            StoredFile::Inline(bytes) => (None, Some(bytes)),
        }
    }

    /// Tamanho conhecido só para conteúdo inline.
    pub fn size(&self) -> Option<i64> {
        match self {
            StoredFile::Inline(bytes) => Some(bytes.len() as i64),
            StoredFile::Reference(_) => None,
        }
    }

    /// Bytes do arquivo; uma referência é lida do disco.
    pub async fn load(self) -> Result<Vec<u8>, AppError> {
        match self {
            StoredFile::Inline(bytes) => Ok(bytes),
            StoredFile::Reference(path) => Ok(tokio::fs::read(&path).await?),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StoredFile::Inline(bytes) => bytes.is_empty(),
            StoredFile::Reference(path) => path.trim().is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_bytes_win_over_path() {
        let file = StoredFile::from_columns(Some("/tmp/a.pdf".into()), Some(vec![1, 2, 3]));
        assert_eq!(file, Some(StoredFile::Inline(vec![1, 2, 3])));
        assert_eq!(StoredFile::from_columns(None, None), None);
    }

    #[test]
    fn reference_keeps_path_and_has_no_size() {
        let file = StoredFile::from_columns(Some("uploads/tissu.png".into()), None).unwrap();
        assert_eq!(file.size(), None);
        assert_eq!(file.into_columns(), (Some("uploads/tissu.png".to_string()), None));
    }

    #[tokio::test]
    async fn inline_content_loads_without_touching_disk() {
        assert_eq!(StoredFile::Inline(vec![7, 8]).load().await.unwrap(), vec![7, 8]);
        assert!(StoredFile::Reference("/nao/existe.pdf".into()).load().await.is_err());
    }

    #[test]
    fn emptiness() {
        assert!(StoredFile::Inline(vec![]).is_empty());
        assert!(StoredFile::Reference("  ".into()).is_empty());
        assert!(!StoredFile::Inline(vec![0]).is_empty());
    }
}
