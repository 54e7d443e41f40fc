//! Built-in roleplay scenarios.

use serde::Serialize;

use crate::language::normalize;

/// Scenario used when nothing else is set; never counts as roleplay.
pub const PRACTICE_SCENARIO: &str = "Language Practice";
pub const PRACTICE_ROLE: &str = "Language Practice Partner";
/// Role used when role inference fails.
pub const FALLBACK_ROLE: &str = "Conversation Partner";
/// Role stored on a freshly created profile.
pub const DEFAULT_AI_ROLE: &str = "AI assistant";

/// A catalog scenario with its description and AI role in every language.
#[derive(Debug)]
pub struct CatalogScenario {
    pub id: &'static str,
    pub title: &'static str,
    /// (language code, description, role)
    localized: &'static [(&'static str, &'static str, &'static str)],
}

impl CatalogScenario {
    /// Description and role for `language`, falling back to English.
    pub fn localized(&self, language: &str) -> (&'static str, &'static str) {
        let code = normalize(language);
        self.localized
            .iter()
            .find(|(lang, _, _)| *lang == code)
            .or_else(|| self.localized.first())
            .map(|(_, desc, role)| (*desc, *role))
            .unwrap_or((self.title, FALLBACK_ROLE))
    }
}

/// Flat view returned by the scenario listing endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub role: String,
    pub custom: bool,
}

static CATALOG: [CatalogScenario; 3] = [
    CatalogScenario {
        id: "restaurant",
        title: "Restaurant",
        localized: &[
            ("en", "The user is in a restaurant ordering food.", "A waiter"),
            ("zh-CN", "用户正在餐厅点餐。", "服务员"),
            ("zh-TW", "使用者正在餐廳點餐。", "服務員"),
            ("ja", "ユーザーはレストランで食べ物を注文しています。", "ウェイター"),
            ("ko", "사용자가 레스토랑에서 음식을 주문하고 있습니다.", "웨이터"),
            ("es", "El usuario está en un restaurante pidiendo comida.", "Un camarero"),
            ("fr", "L'utilisateur est dans un restaurant en train de commander de la nourriture.", "Un serveur"),
            ("de", "Der Benutzer ist in einem Restaurant und bestellt Essen.", "Ein Kellner"),
            ("it", "L'utente è in un ristorante a ordinare cibo.", "Un cameriere"),
            ("hi", "उपयोगकर्ता एक रेस्तरां में भोजन का ऑर्डर दे रहा है।", "एक वेटर"),
        ],
    },
    CatalogScenario {
        id: "job_interview",
        title: "Job Interview",
        localized: &[
            ("en", "The user is in a job interview for a software engineering position.", "An interviewer"),
            ("zh-CN", "用户正在面试软件工程师职位。", "面试官"),
            ("zh-TW", "使用者正在面試軟體工程師職位。", "面試官"),
            ("ja", "ユーザーはソフトウェアエンジニアの職務面接を受けています。", "面接官"),
            ("ko", "사용자가 소프트웨어 엔지니어 직무 면접을 보고 있습니다.", "면접관"),
            ("es", "El usuario está en una entrevista de trabajo para un puesto de ingeniero de software.", "Un entrevistador"),
            ("fr", "L'utilisateur est en entretien d'embauche pour un poste d'ingénieur logiciel.", "Un recruteur"),
            ("de", "Der Benutzer ist in einem Vorstellungsgespräch für eine Stelle als Softwareentwickler.", "Ein Interviewer"),
            ("it", "L'utente è in un colloquio di lavoro per una posizione di ingegnere software.", "Un intervistatore"),
            ("hi", "उपयोगकर्ता सॉफ़्टवेयर इंजीनियर की स्थिति के लिए नौकरी साक्षात्कार में है।", "एक साक्षात्कारकर्ता"),
        ],
    },
    CatalogScenario {
        id: "travel",
        title: "Travel",
        localized: &[
            ("en", "The user is at an airport checking in for a flight.", "A check-in agent"),
            ("zh-CN", "用户正在机场办理登机手续。", "值机员"),
            ("zh-TW", "使用者正在機場辦理登機手續。", "值機員"),
            ("ja", "ユーザーは空港で搭乗手続きをしています。", "チェックイン係員"),
            ("ko", "사용자가 공항에서 비행기 탑승 수속을 하고 있습니다.", "체크인 직원"),
            ("es", "El usuario está en un aeropuerto haciendo el check-in para un vuelo.", "Un agente de facturación"),
            ("fr", "L'utilisateur est à l'aéroport en train de s'enregistrer pour un vol.", "Un agent d'enregistrement"),
            ("de", "Der Benutzer ist am Flughafen und checkt für einen Flug ein.", "Ein Check-in-Agent"),
            ("it", "L'utente è in un aeroporto per il check-in di un volo.", "Un agente di check-in"),
            ("hi", "उपयोगकर्ता हवाई अड्डे पर उड़ान के लिए चेक-इन कर रहा है।", "एक चेक-इन एजेंट"),
        ],
    },
];

/// Looks a scenario up by catalog id (`job_interview`) or title (`Job Interview`).
pub fn find(scenario: &str) -> Option<&'static CatalogScenario> {
    let wanted = scenario.trim();
    CATALOG
        .iter()
        .find(|s| s.id == wanted || s.title.eq_ignore_ascii_case(wanted))
}

/// True when `scenario` is unset or the built-in practice scenario.
pub fn is_practice(scenario: Option<&str>) -> bool {
    match scenario.map(str::trim) {
        None | Some("") => true,
        Some(s) => s == PRACTICE_SCENARIO,
    }
}

/// Catalog entries rendered for `language`, English when it has no table.
pub fn summaries(language: &str) -> Vec<ScenarioSummary> {
    CATALOG
        .iter()
        .map(|s| {
            let (description, role) = s.localized(language);
            ScenarioSummary {
                id: s.id.to_string(),
                title: s.title.to_string(),
                description: description.to_string(),
                role: role.to_string(),
                custom: false,
            }
        })
        .collect()
}
