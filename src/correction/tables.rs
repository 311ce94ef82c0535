//! Correction tables: accented-pronunciation fixes, misspellings, catalog.

/// Heard form to intended English, for a Vietnamese-accented recognizer.
///
/// Keys are unique and may span up to three words.
pub const PRONUNCIATION_FIXES: &[(&str, &str)] = &[
    // Function words
    ("di", "the"),
    ("da", "the"),
    ("de", "the"),
    ("đơ", "the"),
    ("đu", "do"),
    ("đi", "the"),
    ("ai", "i"),
    ("giu", "you"),
    ("du", "you"),
    ("iu", "you"),
    ("diu", "you"),
    ("mai", "my"),
    ("mi", "me"),
    ("wi", "we"),
    ("uy", "we"),
    ("oan", "one"),
    ("tô", "to"),
    ("lo", "love"),
    ("lô", "love"),
    ("lạp", "love"),
    ("lav", "love"),
    ("lớp", "love"),
    ("gui", "guy"),
    ("gai", "guy"),
    ("gơ", "girl"),
    ("gơl", "girl"),
    ("guôn", "girl"),
    ("bây", "by"),
    ("bai", "by"),
    ("bơi", "boy"),
    ("boi", "boy"),
    ("hát", "heart"),
    ("hat", "heart"),
    ("ha", "heart"),
    ("wơ", "world"),
    ("uor", "world"),
    ("worl", "world"),
    ("béc", "baby"),
    ("bây bi", "baby"),
    ("bi", "be"),
    ("bi cause", "because"),
    ("ưn", "and"),
    ("en", "and"),
    ("ơn", "on"),
    ("so", "soul"),
    ("nô", "know"),
    ("no", "know"),
    ("trai", "try"),
    ("tru", "true"),
    ("tru lơ", "true love"),
    ("can", "con"),
    ("wái", "why"),
    ("wai", "why"),
    ("uai", "why"),
    ("uhat", "what"),
    ("oat", "what"),
    ("húc", "who"),
    ("hu", "who"),
    ("hun", "when"),
    ("uen", "when"),
    ("wue", "when"),
    ("der", "there"),
    ("de re", "there"),
    ("hier", "here"),
    ("hi e", "here"),
    ("ol", "all"),
    ("phà", "for"),
    ("pho ever", "forever"),
    ("pho e ver", "forever"),
    ("môn", "moon"),
    ("mun", "moon"),
    ("san", "sun"),
    ("xan", "sun"),
    ("sơn", "sun"),
    ("stá", "star"),
    ("xta", "star"),
    ("sta", "star"),
    ("nait", "night"),
    ("dai", "die"),
    ("life", "life"),
    ("dơ rim", "dream"),
    ("drím", "dream"),
    ("drim", "dream"),
    ("drem", "dream"),
    ("nao", "now"),
    ("nau", "now"),
    ("lai pho", "life"),
    ("lit", "light"),
    ("lài", "light"),
    // Pronouns and verbs
    ("ít", "it"),
    ("ít ít", "is it"),
    ("ơ", "a"),
    ("đét", "that"),
    ("díts", "this"),
    ("uít", "with"),
    ("iu ơ", "your"),
    ("dơ", "your"),
    ("hơ", "her"),
    ("him", "him"),
    ("hít", "his"),
    ("ải", "i"),
    ("cút", "could"),
    ("sút", "should"),
    ("níd", "need"),
    ("nít", "need"),
    ("sẹc", "sex"),
    ("gét", "get"),
    ("gọt", "got"),
    ("cam", "come"),
    ("gô", "go"),
    ("tếch", "take"),
    ("mếch", "make"),
    ("séc", "shake"),
    ("sếch", "shake"),
    ("brếch", "break"),
    ("brếch mai hát", "break my heart"),
    ("sai", "sky"),
    ("cờ lai", "cry"),
    ("cờ rai", "cry"),
    ("phlai", "fly"),
    ("hái", "high"),
    ("lâu", "low"),
    ("xâu", "show"),
    ("nâu", "know"),
    ("xâu mi", "show me"),
    ("teo", "tell"),
    ("xeo", "sell"),
    ("bay", "bay"),
    ("uây", "way"),
    ("đề", "day"),
    ("nài", "night"),
    ("uơ", "were"),
    ("uoz", "was"),
    ("đít", "did"),
    ("giớt", "just"),
    ("gio", "just"),
    ("oăn li", "only"),
    ("ôn li", "only"),
    ("ơ oen", "again"),
    ("ờ ghen", "again"),
    ("rin", "real"),
    ("ri ơ", "real"),
    ("đao", "though"),
    ("rao", "road"),
    ("bơ ri", "bring"),
    ("lít", "little"),
    ("bít", "bit"),
    ("bíc", "big"),
    ("sô mô", "so much"),
    // Title fragments
    ("lai", "like"),
    ("lai diu đu", "like you do"),
    ("diu đu", "you do"),
    ("xép", "shape"),
    ("ộp", "of"),
    ("xép ộp", "shape of"),
    ("xép ộp diu", "shape of you"),
    ("lớp mi", "love me"),
    ("lớp mi lai", "love me like"),
    ("đét xít", "despacito"),
    ("đét xì tô", "despacito"),
    ("báy đinh lai", "blinding lights"),
    ("bai lâu đinh", "blinding"),
    ("đen mon ki", "dance monkey"),
    ("đăng mơn ki", "dance monkey"),
    ("đăng ki mơn", "dance monkey"),
    ("xen ni tô", "senorita"),
    ("xen lái tô", "senorita"),
    ("xen ri ta", "senorita"),
    ("ha va na", "havana"),
    ("ha bà na", "havana"),
    ("pơ phét", "perfect"),
    ("pơ phéc", "perfect"),
    ("sằm oan", "someone"),
    ("hê lô", "hello"),
    ("heo lô", "hello"),
    ("bét gai", "bad guy"),
    ("béc gai", "bad guy"),
    ("lao li", "lovely"),
    ("lav li", "lovely"),
    ("lớp li", "lovely"),
    ("ô san ai", "ocean eyes"),
    ("ô sần ai", "ocean eyes"),
    ("sì tai", "stay"),
    ("stây", "stay"),
    ("xì tây", "stay"),
    ("niu ru", "new rules"),
    ("niu run", "new rules"),
    ("đai na mai", "dynamite"),
    ("đai nờ mai", "dynamite"),
    ("bơ tơ", "butter"),
    ("bát tơ", "butter"),
    ("bát ter", "butter"),
    ("áp tau phan", "uptown funk"),
    ("áp tau phăng", "uptown funk"),
    ("trét sờ", "treasure"),
    ("trê dờ", "treasure"),
    ("lơ iu xeo", "love yourself"),
    ("lớp iu xeo", "love yourself"),
    ("so ri", "sorry"),
    ("xo ri", "sorry"),
    ("xo ơ ri", "sorry"),
    ("pít chét", "peaches"),
    ("pít chít", "peaches"),
    ("gốt", "ghost"),
    ("gốt xờ", "ghost"),
    ("ơ ten sơn", "attention"),
    ("ê ten sần", "attention"),
    ("xì ga", "sugar"),
    ("xu gà", "sugar"),
    ("gơ lai diu", "girls like you"),
    ("gơn lai diu", "girls like you"),
    ("meo mo ri", "memories"),
    ("mê mo ri", "memories"),
    ("meo mô ri", "memories"),
    ("ro", "roar"),
    ("ro ờ", "roar"),
    ("phai ơ uơ", "firework"),
    ("phai ơ uốc", "firework"),
    ("đác hót", "dark horse"),
    ("đác ho", "dark horse"),
    ("tin ết drim", "teenage dream"),
    ("tin ê drim", "teenage dream"),
    ("sếch ít óp", "shake it off"),
    ("sếch ít ọp", "shake it off"),
    ("blanh xờ pếch", "blank space"),
    ("đai a mần", "diamonds"),
    ("đai mần", "diamonds"),
    ("guốc", "work"),
    ("uốc", "work"),
    ("ui phao lơ", "we found love"),
    ("ui phaon lơ", "we found love"),
    ("chíp phì reo", "cheap thrills"),
    ("chíp xì reo", "cheap thrills"),
    ("sen đơ lia", "chandelier"),
    ("chan đờ lia", "chandelier"),
    ("sìi cờ rét", "secrets"),
    ("si cờ rét", "secrets"),
    ("bì li vơ", "believer"),
    ("bi li vờ", "believer"),
    ("săn đờ", "thunder"),
    ("thăn đờ", "thunder"),
    ("pa ra đai", "paradise"),
    ("pa rờ đai", "paradise"),
    ("phích xờ diu", "fix you"),
    ("phíc diu", "fix you"),
    ("gie lâu", "yellow"),
    ("ye lâu", "yellow"),
    ("eo lâu", "yellow"),
    // Artist names
    ("ai đồ", "adele"),
    ("a đen", "adele"),
    ("a sen", "ariana"),
    ("tây lơ", "taylor"),
    ("tay le suýt", "taylor swift"),
    ("tay lor swift", "taylor swift"),
    ("te ler suipt", "taylor swift"),
    ("brúi nô", "bruno"),
    ("bru no", "bruno"),
    ("bờ ru nô", "bruno mars"),
    ("eđ", "ed"),
    ("e đ", "ed"),
    ("e sơ ran", "ed sheeran"),
    ("é si rơn", "ed sheeran"),
    ("si a", "sia"),
    ("xia", "sia"),
    ("ri hâu", "rihanna"),
    ("ri ha na", "rihanna"),
    ("bi yon sê", "beyonce"),
    ("bi dô li", "billie"),
    ("chanh wơ cơ", "charlie puth"),
    ("cha li pu", "charlie puth"),
    ("ját sơn", "justin"),
    ("gát tinh", "justin"),
    ("justion biber", "justin bieber"),
    ("cô vai", "coldplay"),
    ("côn plây", "coldplay"),
    ("côn plề", "coldplay"),
    ("ma ru 5", "maroon 5"),
    ("ma run phái", "maroon 5"),
    ("mà run phai", "maroon 5"),
    ("bít tờ", "bt"),
    ("bi ti es", "bts"),
    ("blơ pịt", "blackpink"),
    ("bơ lắc pin", "blackpink"),
    // Lyric words
    ("sề", "say"),
    ("xề", "say"),
    ("đồn", "don't"),
    ("dồn", "dont"),
    ("đôn", "don't"),
    ("uôn", "want"),
    ("uốn", "want"),
    ("laik", "like"),
    ("laích", "like"),
    ("lịt mi", "let me"),
    ("léc mi", "let me"),
    ("tích mi", "take me"),
    ("tek mi", "take me"),
    ("seng", "sing"),
    ("xing", "sing"),
    ("đến", "dance"),
    ("đen", "dance"),
    ("đăng", "dance"),
    ("pheo", "feel"),
    ("phiu", "feel"),
    ("fiu", "feel"),
    ("gút", "good"),
    ("guốt", "good"),
    ("xo", "show"),
    ("sô", "show"),
    ("mi sô", "me so"),
    ("sơ mơ", "summer"),
    ("sặc mơ", "summer"),
    ("săm mờ", "summer"),
    ("uình", "win"),
    ("uin", "win"),
    ("lút", "lose"),
    ("lu", "lose"),
    // Numbers
    ("oăn", "one"),
    ("tu", "two"),
    ("tư", "two"),
    ("tờ ri", "three"),
    ("xờ ri", "three"),
    ("pho", "four"),
    ("phai", "five"),
    ("xích", "six"),
    ("xe ven", "seven"),
    ("ét", "eight"),
    ("nai", "nine"),
    ("ten", "ten"),
];

/// Per-word misspelling fixes.
pub const TYPO_CORRECTIONS: &[(&str, &str)] = &[
    // Double letters often missed
    ("beutiful", "beautiful"),
    ("beatiful", "beautiful"),
    ("belive", "believe"),
    ("believ", "believe"),
    ("diferent", "different"),
    ("realy", "really"),
    ("actualy", "actually"),
    ("finaly", "finally"),
    ("basicly", "basically"),
    ("definetly", "definitely"),
    ("tomorow", "tomorrow"),
    ("tommorow", "tomorrow"),
    ("untill", "until"),
    ("occured", "occurred"),
    ("hapend", "happened"),
    ("hapened", "happened"),
    // Silent letters
    ("nife", "knife"),
    ("nock", "knock"),
    ("nom", "know"),
    ("rong", "wrong"),
    ("rite", "right"),
    ("lisen", "listen"),
    ("casle", "castle"),
    // Vowel confusion
    ("thier", "their"),
    ("recieve", "receive"),
    ("wierd", "weird"),
    ("freind", "friend"),
    // Title words
    ("somone", "someone"),
    ("somthing", "something"),
    ("everithing", "everything"),
    ("evrything", "everything"),
    ("togeter", "together"),
    ("dangerious", "dangerous"),
    ("begining", "beginning"),
];

/// Well-known titles for fuzzy matching.
pub const CATALOG: &[&str] = &[
    "shape of you",
    "blinding lights",
    "dance monkey",
    "someone like you",
    "hello",
    "perfect",
    "thinking out loud",
    "photograph",
    "castle on the hill",
    "bad guy",
    "lovely",
    "ocean eyes",
    "everything i wanted",
    "happier",
    "drivers license",
    "good 4 u",
    "traitor",
    "deja vu",
    "brutal",
    "watermelon sugar",
    "as it was",
    "late night talking",
    "matilda",
    "stay",
    "industry baby",
    "montero",
    "thats what i want",
    "levitating",
    "dont start now",
    "new rules",
    "one kiss",
    "dynamite",
    "butter",
    "permission to dance",
    "boy with luv",
    "kill this love",
    "how you like that",
    "ice cream",
    "pink venom",
    "despacito",
    "havana",
    "senorita",
    "in my feelings",
    "uptown funk",
    "treasure",
    "24k magic",
    "thats what i like",
    "rolling in the deep",
    "set fire to the rain",
    "skyfall",
    "easy on me",
    "love yourself",
    "sorry",
    "peaches",
    "ghost",
    "baby",
    "attention",
    "we dont talk anymore",
    "one call away",
    "marvin gaye",
    "closer",
    "something just like this",
    "dont let me down",
    "roses",
    "sugar",
    "girls like you",
    "memories",
    "moves like jagger",
    "roar",
    "firework",
    "dark horse",
    "teenage dream",
    "california gurls",
    "shake it off",
    "blank space",
    "love story",
    "anti hero",
    "umbrella",
    "diamonds",
    "work",
    "we found love",
    "cheap thrills",
    "chandelier",
    "titanium",
    "elastic heart",
    "counting stars",
    "apologize",
    "secrets",
    "its time",
    "radioactive",
    "believer",
    "thunder",
    "whatever it takes",
    "viva la vida",
    "paradise",
    "the scientist",
    "fix you",
    "yellow",
    "bohemian rhapsody",
    "we are the champions",
    "dont stop me now",
    "sweet child o mine",
    "november rain",
    "welcome to the jungle",
    "hotel california",
    "stairway to heaven",
    "imagine",
    "billie jean",
    "thriller",
    "beat it",
    "smooth criminal",
    "i will always love you",
    "my heart will go on",
    "hero",
    "let it go",
    "into the unknown",
    "how far ill go",
    "cant help falling in love",
    "unchained melody",
    "careless whisper",
    "midnight rain",
    "karma",
    "lavender haze",
    "flowers",
    "unholy",
    "hold me closer",
    "sunroof",
    "running up that hill",
    "about damn time",
    "heat waves",
    "enemy",
    "unstoppable",
    "i aint worried",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_unique_keys(table: &[(&str, &str)]) {
        let mut seen = HashSet::new();
        for (key, _) in table {
            assert!(seen.insert(*key), "duplicate key {key:?}");
        }
    }

    #[test]
    fn replacement_tables_have_unique_keys() {
        assert_unique_keys(PRONUNCIATION_FIXES);
        assert_unique_keys(TYPO_CORRECTIONS);
    }

    #[test]
    fn catalog_is_normalized() {
        let mut seen = HashSet::new();
        for title in CATALOG {
            assert_eq!(*title, title.to_lowercase().trim());
            assert!(seen.insert(*title), "duplicate title {title:?}");
        }
    }
}
