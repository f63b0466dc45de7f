use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    error::AppError,
    storage::types::medical_document::{CorpusRow, CorpusSource, MedicalDocument},
    utils::config::AppConfig,
};

/// Locations tried, in order, when no explicit corpus path is configured.
pub const DEFAULT_CORPUS_PATHS: [&str; 3] = ["RAG/train.csv", "../RAG/train.csv", "train.csv"];

/// Generic terms appended to built-in documents to aid low-signal matching.
pub const FALLBACK_KEYWORDS: &str = "medical health symptoms treatment";

/// Returns the first existing corpus file among the explicit path and the search list.
pub fn resolve_corpus_path<P: AsRef<Path>>(
    explicit: Option<&str>,
    search_paths: &[P],
) -> Option<PathBuf> {
    explicit
        .map(PathBuf::from)
        .into_iter()
        .chain(search_paths.iter().map(|p| p.as_ref().to_path_buf()))
        .find(|candidate| candidate.is_file())
}

/// Reads question/answer/label rows, skipping rows that fail to parse or lack a field.
pub fn load_rows(path: &Path) -> Result<Vec<MedicalDocument>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let mut documents = Vec::new();
    let mut rejected = 0_usize;

    for (line, record) in reader.deserialize::<CorpusRow>().enumerate() {
        match record {
            Ok(row) => match row.into_document() {
                Some(doc) => documents.push(doc),
                None => {
                    rejected += 1;
                    warn!(line = line + 2, "corpus row missing question, answer or label");
                }
            },
            Err(err) => {
                rejected += 1;
                warn!(line = line + 2, error = %err, "corpus row failed to parse");
            }
        }
    }

    info!(
        path = %path.display(),
        loaded = documents.len(),
        rejected,
        "corpus rows loaded"
    );

    Ok(documents)
}

/// Loads the configured corpus, falling back to the built-in set so the
/// caller always receives at least one document.
pub fn load_documents(config: &AppConfig) -> (Vec<MedicalDocument>, CorpusSource) {
    let Some(path) = resolve_corpus_path(config.corpus_path.as_deref(), &DEFAULT_CORPUS_PATHS)
    else {
        warn!("no corpus file found; using built-in fallback documents");
        return (fallback_documents(), CorpusSource::Fallback);
    };

    match load_rows(&path) {
        Ok(documents) if !documents.is_empty() => (
            documents,
            CorpusSource::Primary {
                path: path.display().to_string(),
            },
        ),
        Ok(_) => {
            warn!(path = %path.display(), "corpus file had no usable rows; using fallback documents");
            (fallback_documents(), CorpusSource::Fallback)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load corpus; using fallback documents");
            (fallback_documents(), CorpusSource::Fallback)
        }
    }
}

/// Built-in bilingual documents covering common conditions.
pub fn fallback_documents() -> Vec<MedicalDocument> {
    vec![
        MedicalDocument::new(
            "ما هي أعراض السكري؟",
            "أعراض السكري تشمل العطش الشديد، كثرة التبول خاصة ليلاً، التعب والإرهاق المستمر، فقدان الوزن غير المبرر، الجوع المفرط، بطء شفاء الجروح، تشوش الرؤية، والالتهابات المتكررة خاصة في المسالك البولية.",
            "Diabetes",
        ),
        MedicalDocument::new(
            "كيف يمكن علاج ارتفاع ضغط الدم؟",
            "علاج ارتفاع ضغط الدم يشمل تغييرات في نمط الحياة مثل تقليل الملح في الطعام، ممارسة التمارين الرياضية بانتظام، الحفاظ على وزن صحي، تجنب التدخين والكحول، إدارة التوتر، وتناول الأدوية المضادة لارتفاع الضغط حسب وصفة الطبيب.",
            "Hypertension",
        ),
        MedicalDocument::new(
            "What are the symptoms of flu?",
            "Flu symptoms include sudden onset of fever (usually high), chills and sweats, severe body aches and muscle pain, fatigue and weakness, dry persistent cough, sore throat, runny or stuffy nose, headache, and sometimes nausea and vomiting.",
            "Influenza",
        ),
        MedicalDocument::new(
            "ما هي أعراض الصداع النصفي؟",
            "أعراض الصداع النصفي تشمل ألم شديد في جانب واحد من الرأس، الغثيان والقيء، الحساسية للضوء والصوت، تشوش الرؤية أو رؤية أضواء، وقد تسبق النوبة أعراض تحذيرية مثل تغيرات في المزاج أو الشهية.",
            "Migraine",
        ),
        MedicalDocument::new(
            "كيف أعالج نزلة البرد؟",
            "علاج نزلة البرد يشمل الراحة التامة، شرب السوائل الدافئة بكثرة، الغرغرة بالماء المالح للحلق، استخدام قطرات الأنف المالحة، تناول فيتامين سي، استخدام مرطب الهواء، وتجنب المهيجات مثل الدخان.",
            "Common Cold",
        ),
        MedicalDocument::new(
            "What causes back pain?",
            "Back pain can be caused by muscle strain from heavy lifting or sudden movements, poor posture, herniated discs, arthritis, osteoporosis, kidney problems, or stress. Most back pain is mechanical and improves with rest, gentle exercise, and proper ergonomics.",
            "Back Pain",
        ),
        MedicalDocument::new(
            "ما هي أعراض التهاب المفاصل؟",
            "أعراض التهاب المفاصل تشمل ألم وتورم في المفاصل، تيبس خاصة في الصباح، صعوبة في الحركة، احمرار ودفء في المنطقة المصابة، وقد يصاحبها تعب عام وحمى خفيفة في بعض الأنواع.",
            "Arthritis",
        ),
        MedicalDocument::new(
            "كيف أتعامل مع القلق والتوتر؟",
            "للتعامل مع القلق والتوتر: مارس تمارين التنفس العميق، احرص على النوم الكافي، مارس الرياضة بانتظام، تجنب الكافيين الزائد، مارس تقنيات الاسترخاء والتأمل، تحدث مع أشخاص تثق بهم، وإذا استمر القلق استشر مختص نفسي.",
            "Anxiety",
        ),
    ]
}
