//! Fixed replies: greeting/thanks precheck, disclaimers and the static fallback.

use retrieval_pipeline::{normalize::contains_arabic, normalize::normalize, ConfidenceTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Arabic,
    English,
}

impl Language {
    pub fn detect(text: &str) -> Self {
        if contains_arabic(text) {
            Self::Arabic
        } else {
            Self::English
        }
    }
}

/// A reply available in both supported languages.
#[derive(Debug, Clone, Copy)]
pub struct CannedReply {
    pub arabic: &'static str,
    pub english: &'static str,
}

impl CannedReply {
    pub const fn text(&self, language: Language) -> &'static str {
        match language {
            Language::Arabic => self.arabic,
            Language::English => self.english,
        }
    }
}

/// One row of an ordered keyword table.
#[derive(Debug, Clone, Copy)]
pub struct CannedRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub reply: CannedReply,
}

impl CannedRule {
    fn matches(&self, normalized_query: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| keyword_matches(normalized_query, keyword))
    }
}

pub static PRECHECK_RULES: &[CannedRule] = &[
    CannedRule {
        name: "greeting",
        keywords: &["hello", "hi", "مرحبا", "السلام عليكم", "أهلا"],
        reply: GREETING_REPLY,
    },
    CannedRule {
        name: "thanks",
        keywords: &["thank you", "thanks", "شكرا", "شكراً"],
        reply: THANKS_REPLY,
    },
];

pub static STATIC_FALLBACK_RULES: &[CannedRule] = &[
    CannedRule {
        name: "fever",
        keywords: &["حمى", "fever", "حرارة"],
        reply: FEVER_REPLY,
    },
    CannedRule {
        name: "headache",
        keywords: &["صداع", "headache", "رأس"],
        reply: HEADACHE_REPLY,
    },
];

const GREETING_REPLY: CannedReply = CannedReply {
    arabic: "مرحباً بك في مساعد الصحة الذكي! 👋\n\nأنا هنا لمساعدتك في الأسئلة الطبية والصحية. يمكنك سؤالي عن:\n• الأعراض والحالات الطبية\n• العلاجات والأدوية\n• النصائح الصحية العامة\n• تحليل الصور الطبية (أشعة، أدوية، فحوصات)\n• متى يجب زيارة الطبيب\n\nكيف يمكنني مساعدتك اليوم؟",
    english: "Welcome to the smart health assistant! 👋\n\nI am here to help with medical and health questions. You can ask me about:\n• Symptoms and medical conditions\n• Treatments and medications\n• General health advice\n• Medical image analysis (x-rays, medications, lab results)\n• When you should see a doctor\n\nHow can I help you today?",
};

const THANKS_REPLY: CannedReply = CannedReply {
    arabic: "على الرحب والسعة! أتمنى لك دوام الصحة والعافية. لا تتردد في سؤالي عن أي شيء آخر. 😊",
    english: "You're welcome! I wish you lasting health. Feel free to ask me anything else. 😊",
};

const FEVER_REPLY: CannedReply = CannedReply {
    arabic: "أعراض الحمى تشمل:\n• ارتفاع درجة حرارة الجسم فوق 38°م\n• القشعريرة والرعشة\n• التعرق\n• الصداع\n• آلام العضلات\n• فقدان الشهية\n• التعب والإرهاق\n\nالعلاج:\n• الراحة وشرب السوائل\n• خافضات الحرارة مثل الباراسيتامول\n• الكمادات الباردة\n\n⚠️ يرجى استشارة طبيب إذا استمرت الحمى أكثر من 3 أيام أو تجاوزت 39°م.",
    english: "Fever symptoms include:\n• Body temperature above 38°C\n• Chills and shivering\n• Sweating\n• Headache\n• Muscle aches\n• Loss of appetite\n• Tiredness and fatigue\n\nTreatment:\n• Rest and plenty of fluids\n• Fever reducers such as paracetamol\n• Cool compresses\n\n⚠️ Please see a doctor if the fever lasts more than 3 days or goes above 39°C.",
};

const HEADACHE_REPLY: CannedReply = CannedReply {
    arabic: "أسباب الصداع الشائعة:\n• التوتر والإجهاد\n• قلة النوم\n• الجفاف\n• الجوع\n• مشاكل العين\n• التهاب الجيوب الأنفية\n\nالعلاج:\n• الراحة في مكان هادئ\n• شرب الماء\n• مسكنات الألم حسب الحاجة\n• تطبيق كمادات باردة أو دافئة\n\n⚠️ استشر طبيب إذا كان الصداع شديد أو مستمر.",
    english: "Common causes of headache:\n• Stress and tension\n• Lack of sleep\n• Dehydration\n• Hunger\n• Eye strain\n• Sinus inflammation\n\nTreatment:\n• Rest in a quiet place\n• Drink water\n• Pain relievers as needed\n• Cold or warm compresses\n\n⚠️ See a doctor if the headache is severe or persistent.",
};

pub const GENERIC_FALLBACK_REPLY: CannedReply = CannedReply {
    arabic: "أواجه صعوبة في توليد إجابة محددة لسؤالك حالياً.\n\nللحصول على معلومات طبية دقيقة، يرجى:\n1. استشارة طبيب مختص\n2. زيارة أقرب مركز صحي\n3. الاتصال بالخط الساخن للاستشارات الطبية\n\n⚠️ هذا النظام للاستعلام العام وليس بديلاً عن الاستشارة الطبية.",
    english: "I'm having trouble producing a specific answer to your question right now.\n\nFor accurate medical information, please:\n1. Consult a specialist doctor\n2. Visit the nearest health centre\n3. Call a medical advice hotline\n\n⚠️ This system is for general information and is not a substitute for medical consultation.",
};

const GROUNDED_DISCLAIMER: CannedReply = CannedReply {
    arabic: "💡 هذه الإجابة مبنية على معلومات من قاعدة البيانات الطبية. للحصول على تشخيص دقيق وعلاج مناسب، يرجى استشارة طبيب مختص.",
    english: "💡 This answer is based on information from the medical knowledge base. For an accurate diagnosis and appropriate treatment, please consult a specialist doctor.",
};

const GENERAL_DISCLAIMER: CannedReply = CannedReply {
    arabic: "⚠️ تنبيه طبي: هذه المعلومات للاستعلام العام فقط. يرجى استشارة طبيب مختص للحصول على التشخيص والعلاج المناسب.",
    english: "⚠️ Medical notice: this information is for general reference only. Please consult a specialist doctor for proper diagnosis and treatment.",
};

const DIRECTIVE_DISCLAIMER: CannedReply = CannedReply {
    arabic: "⚠️ تنبيه: هذه إجابة عامة. يرجى استشارة طبيب مختص للحصول على تشخيص دقيق.",
    english: "⚠️ Notice: this is a general answer. Please consult a specialist doctor for an accurate diagnosis.",
};

pub const EMPTY_INPUT_REPLY: &str = "يرجى إدخال رسالة. Please enter a message.";

const IMAGE_READ_FAILURE: CannedReply = CannedReply {
    arabic: "عذراً، لم أتمكن من قراءة الصورة. تأكد من أن الصورة بتنسيق صحيح.",
    english: "Sorry, I could not read the image. Make sure it is in a supported format.",
};

const IMAGE_ANALYSIS_FAILURE: CannedReply = CannedReply {
    arabic: "عذراً، لم أتمكن من تحليل الصورة. يرجى المحاولة مرة أخرى.",
    english: "Sorry, I could not analyse the image. Please try again.",
};

/// First precheck rule matching the query, with its reply in the query's language.
pub fn precheck(query: &str) -> Option<(&'static str, &'static str)> {
    let language = Language::detect(query);
    let normalized = normalize(query).to_lowercase();
    PRECHECK_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| (rule.name, rule.reply.text(language)))
}

/// Keyword-triggered static answer, or the generic consult message.
pub fn static_response(query: &str) -> &'static str {
    let language = Language::detect(query);
    let normalized = normalize(query).to_lowercase();
    STATIC_FALLBACK_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map_or(GENERIC_FALLBACK_REPLY, |rule| rule.reply)
        .text(language)
}

pub const fn tier_disclaimer(tier: ConfidenceTier, language: Language) -> &'static str {
    match tier {
        ConfidenceTier::High => GROUNDED_DISCLAIMER.text(language),
        ConfidenceTier::Medium | ConfidenceTier::Low => GENERAL_DISCLAIMER.text(language),
    }
}

pub const fn directive_disclaimer(language: Language) -> &'static str {
    DIRECTIVE_DISCLAIMER.text(language)
}

pub const fn image_read_failure(language: Language) -> &'static str {
    IMAGE_READ_FAILURE.text(language)
}

pub const fn image_analysis_failure(language: Language) -> &'static str {
    IMAGE_ANALYSIS_FAILURE.text(language)
}

pub fn with_disclaimer(text: &str, disclaimer: &str) -> String {
    format!("{text}\n\n{disclaimer}")
}

// Attached conjunction, preposition and article forms an Arabic keyword may carry.
const ARABIC_PREFIXES: [&str; 6] = ["", "و", "ب", "ال", "وال", "بال"];

// Keywords match whole tokens of the normalized query; Arabic tokens may carry a prefix.
fn keyword_matches(normalized_query: &str, keyword: &str) -> bool {
    let keyword = normalize(keyword).to_lowercase();
    let keyword_tokens: Vec<&str> = keyword.split(' ').filter(|t| !t.is_empty()).collect();
    let Some((first, rest)) = keyword_tokens.split_first() else {
        return false;
    };
    let prefixes: &[&str] = if contains_arabic(first) {
        &ARABIC_PREFIXES
    } else {
        &[""]
    };

    let query_tokens: Vec<&str> = normalized_query
        .split(' ')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    query_tokens.windows(keyword_tokens.len()).any(|window| {
        let Some((head, tail)) = window.split_first() else {
            return false;
        };
        let head_matches = prefixes
            .iter()
            .any(|prefix| head.strip_prefix(prefix) == Some(*first));
        head_matches && tail == rest
    })
}
