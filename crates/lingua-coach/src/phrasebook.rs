//! Localized fixed phrases used whenever the completion service fails or
//! returns something unusable. Lookups take any language string and fall
//! back to English for codes without an entry.

use crate::language::normalize;
use crate::tutor::Difficulty;

/// Reply used when the model returns nothing or the call fails.
pub fn reply_fallback(language: &str) -> &'static str {
    match normalize(language).as_str() {
        "zh-CN" => "我正在思考该怎么回答。请您再问一次好吗？",
        "zh-TW" => "我正在思考該怎麼回答。請您再問一次好嗎？",
        "ja" => "何を言うべきか考えています。もう一度質問していただけますか？",
        "ko" => "무슨 말을 해야 할지 생각 중입니다. 질문을 다시 해주시겠어요?",
        "es" => "Estoy pensando en qué decir. ¿Podrías repetir tu pregunta?",
        "fr" => "Je réfléchis à quoi dire. Pourriez-vous répéter votre question ?",
        "de" => "Ich überlege, was ich sagen soll. Könnten Sie Ihre Frage wiederholen?",
        "it" => "Sto pensando a cosa dire. Potresti ripetere la tua domanda?",
        "hi" => "मैं सोच रहा हूं कि क्या कहूं। क्या आप अपना प्रश्न दोहरा सकते हैं?",
        _ => "I'm thinking about what to say. Could you please repeat your question?",
    }
}

/// Opening line of the built-in practice scenario.
pub fn practice_greeting(language: &str) -> &'static str {
    match normalize(language).as_str() {
        "zh-CN" => "你好！我是你的语言练习伙伴。今天你想聊些什么？",
        "zh-TW" => "你好！我是你的語言練習夥伴。今天你想聊些什麼？",
        "ja" => "こんにちは！私はあなたの言語練習パートナーです。今日は何について話したいですか？",
        "ko" => "안녕하세요! 저는 당신의 언어 연습 파트너입니다. 오늘 무엇에 대해 이야기하고 싶으신가요?",
        "es" => "¡Hola! Soy tu compañero de práctica de idiomas. ¿Sobre qué te gustaría hablar hoy?",
        "fr" => "Bonjour ! Je suis votre partenaire de pratique linguistique. De quoi aimeriez-vous parler aujourd'hui ?",
        "de" => "Hallo! Ich bin dein Sprachübungspartner. Worüber möchtest du heute sprechen?",
        "it" => "Ciao! Sono il tuo partner di pratica linguistica. Di cosa ti piacerebbe parlare oggi?",
        "hi" => "नमस्ते! मैं आपकी भाषा अभ्यास साथी हूं। आज आप किस विषय पर बात करना चाहेंगे?",
        _ => "Hi there! I'm your language practice partner. What would you like to talk about today?",
    }
}

/// Suggestions offered before any conversation exists.
pub fn default_suggestions(language: &str) -> [&'static str; 3] {
    match normalize(language).as_str() {
        "zh-CN" => ["你好，你好吗？", "很高兴认识你！", "你想聊些什么？"],
        "zh-TW" => ["你好，你好嗎？", "很高興認識你！", "你想聊些什麼？"],
        "ja" => ["こんにちは、お元気ですか？", "はじめまして！", "何について話したいですか？"],
        "ko" => ["안녕하세요, 어떻게 지내세요?", "만나서 반갑습니다!", "무엇에 대해 이야기하고 싶으세요?"],
        "es" => ["¡Hola! ¿Cómo estás?", "¡Encantado de conocerte!", "¿De qué te gustaría hablar?"],
        "fr" => ["Bonjour ! Comment ça va ?", "Ravi de faire votre connaissance !", "De quoi voudrais-tu parler ?"],
        "de" => ["Hallo! Wie geht es dir?", "Schön, dich kennenzulernen!", "Worüber möchtest du sprechen?"],
        "it" => ["Ciao! Come stai?", "Piacere di conoscerti!", "Di cosa ti piacerebbe parlare?"],
        "hi" => ["नमस्ते! आप कैसे हैं?", "आपसे मिलकर खुशी हुई!", "आप किस बारे में बात करना चाहेंगे?"],
        _ => ["Hello, how are you?", "Nice to meet you!", "What would you like to talk about?"],
    }
}

/// Phrases used to top up a short or partly invalid suggestion list.
pub fn backfill_suggestions(language: &str) -> &'static [&'static str] {
    match normalize(language).as_str() {
        "zh-CN" => &[
            "我理解你的意思。",
            "真有意思，能告诉我更多吗？",
            "我同意你的观点。",
            "你对此有什么看法？",
            "你能用不同方式解释一下吗？",
        ],
        "zh-TW" => &[
            "我理解你的意思。",
            "真有意思，能告訴我更多嗎？",
            "我同意你的觀點。",
            "你對此有什麼看法？",
            "你能用不同方式解釋一下嗎？",
        ],
        "ja" => &[
            "あなたの言っていることは理解できます。",
            "それは面白いですね。もっと教えてください。",
            "あなたの視点に同意します。",
            "これについてどう思いますか？",
            "別の方法で説明していただけますか？",
        ],
        "ko" => &[
            "당신이 말하는 것을 이해합니다.",
            "흥미롭네요. 더 자세히 알려주시겠어요?",
            "당신의 관점에 동의합니다.",
            "이것에 대해 어떻게 생각하세요?",
            "다른 방식으로 설명해 주시겠어요?",
        ],
        "es" => &[
            "Entiendo lo que estás diciendo.",
            "Eso es interesante. ¿Puedes contarme más?",
            "Estoy de acuerdo con tu perspectiva.",
            "¿Qué piensas sobre esto?",
            "¿Podrías explicarlo de otra manera?",
        ],
        "fr" => &[
            "Je comprends ce que tu dis.",
            "C'est intéressant. Peux-tu m'en dire plus ?",
            "Je suis d'accord avec ton point de vue.",
            "Qu'en penses-tu ?",
            "Pourrais-tu l'expliquer différemment ?",
        ],
        "de" => &[
            "Ich verstehe, was du sagst.",
            "Das ist interessant. Kannst du mir mehr darüber erzählen?",
            "Ich stimme deiner Perspektive zu.",
            "Was denkst du darüber?",
            "Könntest du das anders erklären?",
        ],
        "it" => &[
            "Capisco quello che stai dicendo.",
            "È interessante. Puoi dirmi di più?",
            "Sono d'accordo con la tua prospettiva.",
            "Cosa ne pensi di questo?",
            "Potresti spiegarlo in modo diverso?",
        ],
        "hi" => &[
            "मैं समझता हूं कि आप क्या कह रहे हैं।",
            "यह दिलचस्प है। क्या आप मुझे और बता सकते हैं?",
            "मैं आपके दृष्टिकोण से सहमत हूं।",
            "आप इसके बारे में क्या सोचते हैं?",
            "क्या आप इसे दूसरे तरीके से समझा सकते हैं?",
        ],
        _ => &[
            "I understand what you're saying.",
            "That's interesting. Can you tell me more?",
            "I agree with your perspective.",
            "What do you think about this?",
            "Could you explain that differently?",
        ],
    }
}

/// Replacement pool for suggestions that drifted out of a high-drift language.
/// Empty for languages without a lexical check.
pub fn drift_replacements(language: &str) -> &'static [&'static str] {
    match normalize(language).as_str() {
        "it" => &[
            "Mi piacerebbe sapere di più su questo.",
            "Potrebbe spiegare meglio, per favore?",
            "Interessante, continui pure.",
        ],
        "hi" => &[
            "मुझे इस बारे में अधिक जानना अच्छा लगेगा।",
            "क्या आप इसे बेहतर ढंग से समझा सकते हैं?",
            "दिलचस्प, कृपया जारी रखें।",
        ],
        _ => &[],
    }
}

/// Generic lessons used to top up a short lesson list.
pub fn backfill_lessons(language: &str) -> [&'static str; 3] {
    match normalize(language).as_str() {
        "zh-CN" => [
            "练习在日常交流中自然的对话流程和常用表达方式",
            "根据你的兴趣和谈话主题积累专门的词汇",
            "在自然的对话中练习使用正确的语法结构",
        ],
        "zh-TW" => [
            "練習在日常交流中自然的對話流程和常用表達方式",
            "根據你的興趣和談話主題累積專門的詞彙",
            "在自然的對話中練習使用正確的語法結構",
        ],
        "ja" => [
            "日常会話の自然な流れとカジュアルな表現を練習する",
            "興味のある話題に合わせて専門的な語彙を増やす",
            "自然な会話の中で正しい文法構造を使う練習をする",
        ],
        "ko" => [
            "일상 대화의 자연스러운 흐름과 일반적인 표현을 연습하기",
            "관심 있는 주제에 맞는 전문 어휘를 늘리기",
            "자연스러운 대화 속에서 올바른 문법 구조를 사용하는 연습하기",
        ],
        "es" => [
            "Practica los flujos de diálogo naturales y las expresiones comunes utilizadas en situaciones informales",
            "Amplía tu vocabulario especializado según tus intereses y los temas de conversación",
            "Practica el uso de estructuras gramaticales correctas dentro de una conversación natural",
        ],
        "fr" => [
            "Pratiquez les flux de dialogue naturels et les expressions courantes utilisées dans des contextes informels",
            "Développez un vocabulaire spécialisé selon vos centres d'intérêt et vos sujets de conversation",
            "Entraînez-vous à utiliser des structures grammaticales correctes dans une conversation naturelle",
        ],
        "de" => [
            "Üben Sie natürliche Dialogflüsse und gängige Ausdrücke, die in informellen Situationen verwendet werden",
            "Bauen Sie einen Fachwortschatz zu Ihren Interessen und Gesprächsthemen auf",
            "Üben Sie korrekte grammatische Strukturen in einem natürlichen Gesprächsfluss",
        ],
        "it" => [
            "Pratica i flussi di dialogo naturali e le espressioni comuni utilizzate in contesti informali",
            "Costruisci un vocabolario specifico basato sui tuoi interessi e sugli argomenti di conversazione",
            "Esercitati a usare strutture grammaticali corrette all'interno di una conversazione naturale",
        ],
        "hi" => [
            "आम बातचीत में प्राकृतिक संवाद प्रवाह और सामान्य अभिव्यक्तियों का अभ्यास करें",
            "अपनी रुचियों और बातचीत के विषयों के आधार पर विशेष शब्दावली बनाएं",
            "स्वाभाविक बातचीत में सही व्याकरण संरचनाओं का उपयोग करने का अभ्यास करें",
        ],
        _ => [
            "Practice natural dialogue flows and common expressions used in casual settings",
            "Build specialized vocabulary sets based on your interests and conversation topics",
            "Practice using correct grammar structures within natural conversation flow",
        ],
    }
}

/// Offline pronunciation material: words for `easy`, sentences otherwise.
pub fn practice_fallback(language: &str, difficulty: Difficulty) -> &'static [&'static str] {
    match (normalize(language).as_str(), difficulty) {
        ("zh-CN", Difficulty::Easy) => &["你好", "苹果", "书", "朋友", "水", "家", "狗", "猫", "谢谢", "再见"],
        ("zh-CN", Difficulty::Medium) => &["我想预约一下。", "你能再说一遍吗？", "会议什么时候开始？", "我需要改善我的发音。"],
        ("zh-CN", Difficulty::Hard) => &[
            "中文发音有时可能很有挑战性。",
            "我认为有效的沟通在当今全球经济中是必不可少的。",
            "理解文化细节可以大大提高语言学习效果。",
        ],
        ("zh-TW", Difficulty::Easy) => &["你好", "蘋果", "書", "朋友", "水", "家", "狗", "貓", "謝謝", "再見"],
        ("zh-TW", Difficulty::Medium) => &["我想預約一下。", "你能再說一遍嗎？", "會議什麼時候開始？", "我需要改善我的發音。"],
        ("zh-TW", Difficulty::Hard) => &[
            "中文發音有時可能很有挑戰性。",
            "我認為有效的溝通在當今全球經濟中是必不可少的。",
            "理解文化細節可以大大提高語言學習效果。",
        ],
        ("ja", Difficulty::Easy) => &["こんにちは", "りんご", "本", "友達", "水", "家", "犬", "猫", "ありがとう", "さようなら"],
        ("ja", Difficulty::Medium) => &[
            "予約を取りたいのですが。",
            "もう一度言っていただけますか？",
            "会議は何時に始まりますか？",
            "発音を改善したいです。",
        ],
        ("ja", Difficulty::Hard) => &[
            "日本語の発音は時として難しいことがあります。",
            "効果的なコミュニケーションは現代のグローバル経済において不可欠です。",
            "文化的なニュアンスを理解することで語学学習が大幅に向上します。",
        ],
        ("ko", Difficulty::Easy) => &["안녕하세요", "사과", "책", "친구", "물", "집", "개", "고양이", "감사합니다", "음악"],
        ("ko", Difficulty::Medium) => &[
            "예약을 하고 싶습니다.",
            "다시 한 번 말씀해 주시겠어요?",
            "회의는 몇 시에 시작하나요?",
            "발음을 개선하고 싶습니다.",
        ],
        ("ko", Difficulty::Hard) => &[
            "한국어 발음은 때때로 어려울 수 있습니다.",
            "효과적인 의사소통은 오늘날의 글로벌 경제에서 필수적입니다.",
            "문화적 뉘앙스를 이해하면 언어 학습이 크게 향상될 수 있습니다.",
        ],
        ("es", Difficulty::Easy) => &["hola", "manzana", "libro", "amigo", "agua", "casa", "perro", "gato", "gracias", "adiós"],
        ("es", Difficulty::Medium) => &[
            "Me gustaría programar una cita.",
            "¿Podrías repetir eso?",
            "¿A qué hora empieza la reunión?",
            "Necesito mejorar mi pronunciación.",
        ],
        ("es", Difficulty::Hard) => &[
            "La pronunciación de ciertas palabras españolas puede ser desafiante.",
            "Creo que la comunicación efectiva es esencial en la economía global de hoy.",
            "Entender los matices culturales puede mejorar enormemente el aprendizaje de idiomas.",
        ],
        ("fr", Difficulty::Easy) => &["bonjour", "pomme", "livre", "ami", "eau", "maison", "chien", "chat", "merci", "au revoir"],
        ("fr", Difficulty::Medium) => &[
            "J'aimerais prendre rendez-vous.",
            "Pourriez-vous répéter cela ?",
            "À quelle heure commence la réunion ?",
            "Je dois améliorer ma prononciation.",
        ],
        ("fr", Difficulty::Hard) => &[
            "La prononciation de certains mots français peut être difficile.",
            "Je crois que la communication efficace est essentielle dans l'économie mondiale actuelle.",
            "Comprendre les nuances culturelles peut grandement améliorer l'apprentissage des langues.",
        ],
        ("de", Difficulty::Easy) => &["hallo", "Apfel", "Buch", "Freund", "Wasser", "Haus", "Hund", "Katze", "danke", "bitte"],
        ("de", Difficulty::Medium) => &[
            "Ich möchte einen Termin vereinbaren.",
            "Könnten Sie das bitte wiederholen?",
            "Wann beginnt das Meeting?",
            "Ich muss meine Aussprache verbessern.",
        ],
        ("de", Difficulty::Hard) => &[
            "Die Aussprache bestimmter deutscher Wörter kann herausfordernd sein.",
            "Ich glaube, dass effektive Kommunikation in der heutigen globalen Wirtschaft unerlässlich ist.",
            "Das Verständnis kultureller Nuancen kann das Sprachenlernen erheblich verbessern.",
        ],
        ("it", Difficulty::Easy) => &["ciao", "mela", "libro", "amico", "acqua", "casa", "cane", "gatto", "grazie", "arrivederci"],
        ("it", Difficulty::Medium) => &[
            "Vorrei prenotare un appuntamento.",
            "Puoi ripetere per favore?",
            "A che ora inizia la riunione?",
            "Devo migliorare la mia pronuncia.",
        ],
        ("it", Difficulty::Hard) => &[
            "La pronuncia di alcune parole italiane può essere impegnativa.",
            "Credo che una comunicazione efficace sia essenziale nell'economia globale di oggi.",
            "Comprendere le sfumature culturali può migliorare notevolmente l'apprendimento delle lingue.",
        ],
        ("hi", Difficulty::Easy) => &["नमस्ते", "सेब", "किताब", "मित्र", "पानी", "घर", "कुत्ता", "बिल्ली", "धन्यवाद", "अलविदा"],
        ("hi", Difficulty::Medium) => &[
            "मैं एक अपॉइंटमेंट लेना चाहता हूँ।",
            "क्या आप इसे दोहरा सकते हैं?",
            "बैठक कब शुरू होगी?",
            "मुझे अपना उच्चारण सुधारने की जरूरत है।",
        ],
        ("hi", Difficulty::Hard) => &[
            "कुछ हिंदी शब्दों का उच्चारण चुनौतीपूर्ण हो सकता है।",
            "मेरा मानना है कि प्रभावी संवाद आज की वैश्विक अर्थव्यवस्था में आवश्यक है।",
            "संस्कृति की बारीकियों को समझना भाषा सीखने को बहुत बढ़ा सकता है।",
        ],
        (_, Difficulty::Easy) => &[
            "hello", "apple", "book", "friend", "water", "house", "music", "travel", "weather", "family",
        ],
        (_, Difficulty::Medium) => &[
            "I'd like to schedule an appointment.",
            "Could you please repeat that?",
            "What time does the meeting start?",
            "I need to improve my pronunciation.",
            "Can you recommend a good restaurant?",
        ],
        (_, Difficulty::Hard) => &[
            "The pronunciation of certain English words can be challenging.",
            "I believe that effective communication is essential in today's global economy.",
            "Understanding cultural nuances can greatly enhance language learning.",
            "The intricacies of grammar can often lead to confusion for learners.",
        ],
    }
}

/// Study words handed out when vocabulary generation yields nothing usable.
pub fn vocabulary_fallback(language: &str) -> &'static [&'static str] {
    match normalize(language).as_str() {
        "zh-CN" => &["练习", "学习", "说话", "听", "理解"],
        "zh-TW" => &["練習", "學習", "說話", "聽", "理解"],
        "ja" => &["練習", "学習", "話す", "聞く", "理解"],
        "ko" => &["연습", "학습", "말하기", "듣기", "이해"],
        "es" => &["práctica", "aprender", "hablar", "escuchar", "entender"],
        "fr" => &["pratique", "apprendre", "parler", "écouter", "comprendre"],
        "de" => &["Übung", "lernen", "sprechen", "hören", "verstehen"],
        "it" => &["pratica", "imparare", "parlare", "ascoltare", "capire"],
        "hi" => &["अभ्यास", "सीखना", "बोलना", "सुनना", "समझना"],
        _ => &["practice", "learn", "speak", "listen", "understand"],
    }
}
