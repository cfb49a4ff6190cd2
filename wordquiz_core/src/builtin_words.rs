//! Built-in English / Korean word table, grouped by level.

/// (english, korean, level)
pub(crate) const BUILTIN_WORDS: &[(&str, &str, u8)] = &[
    // Level 1: very easy, basic words
    ("apple", "사과", 1),
    ("dog", "개", 1),
    ("cat", "고양이", 1),
    ("mom", "엄마", 1),
    ("dad", "아빠", 1),
    ("milk", "우유", 1),
    ("egg", "달걀", 1),
    ("water", "물", 1),
    ("sun", "해", 1),
    ("moon", "달", 1),
    ("star", "별", 1),
    ("fish", "물고기", 1),
    ("bird", "새", 1),
    ("tree", "나무", 1),
    ("flower", "꽃", 1),
    ("ball", "공", 1),
    ("book", "책", 1),
    ("hand", "손", 1),
    ("eye", "눈", 1),
    ("nose", "코", 1),
    // Level 2: easy, common objects
    ("chair", "의자", 2),
    ("desk", "책상", 2),
    ("pencil", "연필", 2),
    ("bag", "가방", 2),
    ("shoe", "신발", 2),
    ("hat", "모자", 2),
    ("cup", "컵", 2),
    ("spoon", "숟가락", 2),
    ("window", "창문", 2),
    ("door", "문", 2),
    ("clock", "시계", 2),
    ("bed", "침대", 2),
    ("car", "자동차", 2),
    ("bus", "버스", 2),
    ("bicycle", "자전거", 2),
    ("umbrella", "우산", 2),
    ("phone", "전화기", 2),
    ("bread", "빵", 2),
    ("rice", "밥", 2),
    ("key", "열쇠", 2),
    // Level 3: medium, places and colours
    ("school", "학교", 3),
    ("hospital", "병원", 3),
    ("library", "도서관", 3),
    ("park", "공원", 3),
    ("market", "시장", 3),
    ("bank", "은행", 3),
    ("station", "역", 3),
    ("airport", "공항", 3),
    ("zoo", "동물원", 3),
    ("beach", "해변", 3),
    ("red", "빨간색", 3),
    ("blue", "파란색", 3),
    ("yellow", "노란색", 3),
    ("green", "초록색", 3),
    ("white", "하얀색", 3),
    ("black", "검은색", 3),
    ("purple", "보라색", 3),
    ("orange", "주황색", 3),
    ("pink", "분홍색", 3),
    ("brown", "갈색", 3),
    // Level 4: hard, adjectives and jobs
    ("happy", "행복한", 4),
    ("sad", "슬픈", 4),
    ("angry", "화난", 4),
    ("tired", "피곤한", 4),
    ("brave", "용감한", 4),
    ("kind", "친절한", 4),
    ("quiet", "조용한", 4),
    ("busy", "바쁜", 4),
    ("strong", "강한", 4),
    ("famous", "유명한", 4),
    ("doctor", "의사", 4),
    ("teacher", "선생님", 4),
    ("farmer", "농부", 4),
    ("police officer", "경찰관", 4),
    ("firefighter", "소방관", 4),
    ("cook", "요리사", 4),
    ("scientist", "과학자", 4),
    ("pilot", "조종사", 4),
    ("singer", "가수", 4),
    ("artist", "화가", 4),
    // Level 5: challenge, abstract and science
    ("freedom", "자유", 5),
    ("courage", "용기", 5),
    ("memory", "기억", 5),
    ("future", "미래", 5),
    ("history", "역사", 5),
    ("experience", "경험", 5),
    ("opinion", "의견", 5),
    ("environment", "환경", 5),
    ("energy", "에너지", 5),
    ("gravity", "중력", 5),
    ("planet", "행성", 5),
    ("universe", "우주", 5),
    ("oxygen", "산소", 5),
    ("electricity", "전기", 5),
    ("experiment", "실험", 5),
    ("temperature", "온도", 5),
    ("volcano", "화산", 5),
    ("evolution", "진화", 5),
    ("imagination", "상상력", 5),
    ("responsibility", "책임", 5),
];
