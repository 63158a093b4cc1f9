//! Seeding the scheme store.
//!
//! Seed files are YAML (`.yml`, `.yaml`) or JSON (`.json`) holding either a
//! list of schemes or a mapping with a `schemes` list.

use crate::store::SqliteSchemeRepository;
use sanchar_core::{AppError, AppResult, NewScheme};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Summary of a seeding run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedStats {
    /// Schemes written by this run
    pub inserted: usize,

    /// Schemes in the store afterwards
    pub total: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedDocument {
    List(Vec<NewScheme>),
    Wrapped { schemes: Vec<NewScheme> },
}

impl SeedDocument {
    fn into_schemes(self) -> Vec<NewScheme> {
        match self {
            Self::List(schemes) | Self::Wrapped { schemes } => schemes,
        }
    }
}

/// Write `schemes` to the store in one transaction.
///
/// With `reset` the store is emptied first, so seeding is idempotent.
pub fn seed(
    repository: &SqliteSchemeRepository,
    schemes: Vec<NewScheme>,
    reset: bool,
) -> AppResult<SeedStats> {
    let start = Instant::now();

    tracing::info!("Seeding {} schemes (reset: {})", schemes.len(), reset);

    let inserted = repository.insert_all(schemes, reset)?.len();
    let total = repository.count()?;
    let duration = start.elapsed();

    tracing::info!(
        "Seeding completed: {} inserted, {} total in {:.2}s",
        inserted,
        total,
        duration.as_secs_f64()
    );

    Ok(SeedStats {
        inserted,
        total,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Read schemes from one seed file.
pub fn load_seed_file(path: &Path) -> AppResult<Vec<NewScheme>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read seed file {:?}: {}", path, e))
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let document: SeedDocument = match extension.as_deref() {
        Some("yml") | Some("yaml") => serde_yaml::from_str(&contents)?,
        Some("json") => serde_json::from_str(&contents)?,
        _ => {
            return Err(AppError::Config(format!(
                "Unsupported seed file {:?}. Expected .yml, .yaml or .json",
                path
            )))
        }
    };

    let schemes = document.into_schemes();
    tracing::debug!("Loaded {} schemes from {:?}", schemes.len(), path);

    Ok(schemes)
}

/// Read every seed file under `dir`, in file-name order.
pub fn load_seed_dir(dir: &Path) -> AppResult<Vec<NewScheme>> {
    if !dir.is_dir() {
        return Err(AppError::Config(format!(
            "Seed directory {:?} does not exist",
            dir
        )));
    }

    let mut schemes = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_seed_file(path) {
            schemes.extend(load_seed_file(path)?);
        }
    }

    Ok(schemes)
}

fn is_seed_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref(),
        Some("yml") | Some("yaml") | Some("json")
    )
}

/// The built-in sample corpus of five national schemes, summarized in Hindi.
pub fn sample_schemes() -> Vec<NewScheme> {
    vec![
        sample(
            "प्रधानमंत्री जन धन योजना",
            "वित्तीय समावेशन",
            "भारत का कोई भी नागरिक जिसके पास बैंक खाता नहीं है",
            "मुफ्त बैंक खाता, डेबिट कार्ड, 2 लाख रुपये का दुर्घटना बीमा, ओवरड्राफ्ट सुविधा",
            "नजदीकी बैंक शाखा में जाकर आधार कार्ड के साथ आवेदन करें",
            "बैंक खाता, जन धन, वित्तीय समावेशन, मुफ्त खाता, डेबिट कार्ड",
            "प्रधानमंत्री जन धन योजना एक वित्तीय समावेशन कार्यक्रम है जो सभी भारतीयों को बैंकिंग सेवाएं प्रदान करता है।",
        ),
        sample(
            "आयुष्मान भारत योजना",
            "स्वास्थ्य",
            "गरीब और कमजोर परिवार (SECC 2011 के अनुसार)",
            "5 लाख रुपये तक का मुफ्त इलाज, कैशलेस उपचार, पैनल अस्पतालों में सुविधा",
            "नजदीकी CSC केंद्र या अस्पताल में आयुष्मान कार्ड बनवाएं",
            "स्वास्थ्य बीमा, आयुष्मान भारत, मुफ्त इलाज, 5 लाख कवर, कैशलेस",
            "आयुष्मान भारत योजना दुनिया की सबसे बड़ी स्वास्थ्य बीमा योजना है जो गरीब परिवारों को मुफ्त इलाज प्रदान करती है।",
        ),
        sample(
            "प्रधानमंत्री किसान सम्मान निधि",
            "कृषि",
            "छोटे और सीमांत किसान (2 हेक्टेयर तक भूमि)",
            "सालाना 6000 रुपये की आर्थिक सहायता (तीन किस्तों में)",
            "PM-KISAN पोर्टल पर ऑनलाइन आवेदन या CSC केंद्र में जाकर",
            "किसान, PM-KISAN, 6000 रुपये, कृषि सहायता, सीमांत किसान",
            "प्रधानमंत्री किसान सम्मान निधि योजना छोटे किसानों को आर्थिक सहायता प्रदान करती है।",
        ),
        sample(
            "बेटी बचाओ बेटी पढ़ाओ",
            "महिला कल्याण",
            "सभी बालिकाएं और उनके परिवार",
            "बालिकाओं की शिक्षा और सुरक्षा, जागरूकता कार्यक्रम, छात्रवृत्ति",
            "स्थानीय महिला एवं बाल विकास कार्यालय में संपर्क करें",
            "बेटी बचाओ, बालिका शिक्षा, महिला सशक्तिकरण, छात्रवृत्ति",
            "बेटी बचाओ बेटी पढ़ाओ योजना बालिकाओं की सुरक्षा और शिक्षा को बढ़ावा देती है।",
        ),
        sample(
            "प्रधानमंत्री आवास योजना",
            "आवास",
            "आर्थिक रूप से कमजोर वर्ग, निम्न आय वर्ग, मध्यम आय वर्ग",
            "सब्सिडी के साथ घर खरीदने या बनाने में सहायता, कम ब्याज दर",
            "PMAY पोर्टल पर ऑनलाइन आवेदन या बैंक में जाकर",
            "आवास योजना, घर, सब्सिडी, PMAY, कम ब्याज दर",
            "प्रधानमंत्री आवास योजना सभी को पक्का घर उपलब्ध कराने का लक्ष्य रखती है।",
        ),
    ]
}

fn sample(
    name: &str,
    category: &str,
    eligibility: &str,
    benefits: &str,
    how_to_apply: &str,
    keywords: &str,
    localized_summary: &str,
) -> NewScheme {
    NewScheme {
        name: name.to_string(),
        category: category.to_string(),
        eligibility: eligibility.to_string(),
        benefits: benefits.to_string(),
        how_to_apply: how_to_apply.to_string(),
        keywords: keywords.to_string(),
        localized_summary: localized_summary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const YAML_SEED: &str = r#"
schemes:
  - scheme_name: अटल पेंशन योजना
    category: सामाजिक सुरक्षा
    eligibility: 18 से 40 वर्ष के नागरिक
    benefits: 60 वर्ष के बाद 1000 से 5000 रुपये मासिक पेंशन
    how_to_apply: बैंक शाखा में आवेदन करें
    keywords: पेंशन, अटल, वृद्धावस्था
    localized_summary: अटल पेंशन योजना असंगठित क्षेत्र के लिए पेंशन देती है।
"#;

    #[test]
    fn test_sample_corpus_is_valid() {
        let schemes = sample_schemes();
        assert_eq!(schemes.len(), 5);
        for scheme in schemes {
            assert!(scheme.validated().is_ok());
        }
    }

    #[test]
    fn test_seed_with_reset_is_idempotent() {
        let repo = SqliteSchemeRepository::open_in_memory().unwrap();

        let first = seed(&repo, sample_schemes(), true).unwrap();
        let second = seed(&repo, sample_schemes(), true).unwrap();

        assert_eq!(first.inserted, 5);
        assert_eq!(second.total, 5);
    }

    #[test]
    fn test_seed_without_reset_appends() {
        let repo = SqliteSchemeRepository::open_in_memory().unwrap();
        seed(&repo, sample_schemes(), false).unwrap();

        let stats = seed(&repo, sample_schemes(), false).unwrap();
        assert_eq!(stats.inserted, 5);
        assert_eq!(stats.total, 10);
    }

    #[test]
    fn test_load_yaml_wrapped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pension.yml");
        fs::write(&path, YAML_SEED).unwrap();

        let schemes = load_seed_file(&path).unwrap();
        assert_eq!(schemes.len(), 1);
        assert_eq!(schemes[0].name, "अटल पेंशन योजना");
    }

    #[test]
    fn test_load_json_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("samples.json");
        fs::write(&path, serde_json::to_string(&sample_schemes()).unwrap()).unwrap();

        let schemes = load_seed_file(&path).unwrap();
        assert_eq!(schemes, sample_schemes());
    }

    #[test]
    fn test_unsupported_extension_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("schemes.csv");
        fs::write(&path, "name,category").unwrap();

        assert!(load_seed_file(&path).is_err());
    }

    #[test]
    fn test_load_dir_in_file_name_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.yml"), YAML_SEED).unwrap();
        fs::write(
            temp.path().join("a.json"),
            serde_json::to_string(&sample_schemes()).unwrap(),
        )
        .unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let schemes = load_seed_dir(temp.path()).unwrap();
        assert_eq!(schemes.len(), 6);
        assert_eq!(schemes[0].name, "प्रधानमंत्री जन धन योजना");
        assert_eq!(schemes[5].name, "अटल पेंशन योजना");
    }

    #[test]
    fn test_load_missing_dir_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(load_seed_dir(&temp.path().join("missing")).is_err());
    }
}
