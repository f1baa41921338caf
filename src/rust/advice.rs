//! Prevention and treatment notes keyed by `(species, condition)` exactly as
//! the label catalog formats them.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::classifier::{is_healthy_label, RankedPrediction};

/// What to do about a detected disease
#[derive(Debug, PartialEq, Eq)]
pub struct Treatment {
    pub prevention: &'static [&'static str],
    pub medication: &'static [&'static str],
}

/// Upkeep notes for a healthy plant
#[derive(Debug, PartialEq, Eq)]
pub struct CareTips {
    pub message: &'static str,
    pub fun_fact: &'static str,
    pub care_tips: &'static [&'static str],
}

#[derive(Debug, PartialEq, Eq)]
pub enum Advice {
    Treatment(&'static Treatment),
    HealthyCare(&'static CareTips),
    Undocumented { condition: String },
}

impl Advice {
    pub fn is_documented(&self) -> bool {
        !matches!(self, Advice::Undocumented { .. })
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Treatment(t) => {
                writeln!(f, "Prevention:")?;
                for tip in t.prevention {
                    writeln!(f, "  - {}", tip)?;
                }
                writeln!(f, "Treatment:")?;
                for med in t.medication {
                    writeln!(f, "  - {}", med)?;
                }
                write!(
                    f,
                    "Always follow product labels and local regulations when applying treatments. \
                     Consult an agricultural expert for severe cases."
                )
            }
            Advice::HealthyCare(c) => {
                writeln!(f, "{}", c.message)?;
                writeln!(f, "Fun fact: {}", c.fun_fact)?;
                writeln!(f, "Care tips:")?;
                for (i, tip) in c.care_tips.iter().enumerate() {
                    if i + 1 == c.care_tips.len() {
                        write!(f, "  - {}", tip)?;
                    } else {
                        writeln!(f, "  - {}", tip)?;
                    }
                }
                Ok(())
            }
            Advice::Undocumented { condition } => write!(
                f,
                "Detailed treatment information for '{}' is not yet documented. \
                 Please consult a local agricultural expert for specific recommendations.",
                condition
            ),
        }
    }
}

/// Advice for a species/condition pair.
///
/// Healthy conditions get species care tips (generic ones for unlisted
/// species). Diseases get a treatment when one is documented for exactly that
/// pair; surrounding whitespace in the condition is ignored.
pub fn lookup(species: &str, condition: &str) -> Advice {
    let species = species.trim();
    let condition = condition.trim();
    if is_healthy_label(condition) {
        let tips = HEALTHY.get(species).copied().unwrap_or(&GENERIC_CARE);
        return Advice::HealthyCare(tips);
    }
    match TREATMENTS.get(&(species, condition)) {
        Some(treatment) => Advice::Treatment(treatment),
        None => Advice::Undocumented { condition: condition.to_string() },
    }
}

/// Advice for a classifier result, following its health flag.
pub fn for_prediction(prediction: &RankedPrediction) -> Advice {
    if prediction.is_healthy {
        let tips = HEALTHY
            .get(prediction.species.trim())
            .copied()
            .unwrap_or(&GENERIC_CARE);
        Advice::HealthyCare(tips)
    } else {
        lookup(&prediction.species, &prediction.condition)
    }
}

lazy_static! {
    static ref TREATMENTS: HashMap<(&'static str, &'static str), &'static Treatment> = TREATMENT_TABLE
        .iter()
        .map(|(species, condition, treatment)| ((*species, *condition), treatment))
        .collect();
    static ref HEALTHY: HashMap<&'static str, &'static CareTips> = CARE_TABLE
        .iter()
        .map(|(species, tips)| (*species, tips))
        .collect();
}

static GENERIC_CARE: CareTips = CareTips {
    message: "Your plant is in excellent health! Keep nurturing it.",
    fun_fact: "Healthy plants can live for decades with proper care!",
    care_tips: &[
        "Water appropriately for the species",
        "Ensure proper sunlight exposure",
        "Use quality soil with good drainage",
        "Monitor regularly for early signs of stress",
    ],
};

static TREATMENT_TABLE: &[(&str, &str, Treatment)] = &[
    ("Apple", "Apple scab", Treatment {
        prevention: &[
            "Remove and destroy fallen leaves in autumn",
            "Prune trees to improve air circulation",
            "Plant resistant apple varieties (Liberty, Freedom, Enterprise)",
            "Avoid overhead irrigation",
        ],
        medication: &[
            "Captan fungicide spray",
            "Myclobutanil (Immunox)",
            "Sulfur-based fungicides",
            "Apply fungicide at bud break, repeat every 7-10 days",
        ],
    }),
    ("Apple", "Black rot", Treatment {
        prevention: &[
            "Remove mummified fruits and cankers",
            "Prune dead or diseased branches",
            "Maintain good tree hygiene",
            "Ensure proper spacing between trees",
        ],
        medication: &[
            "Captan or Mancozeb fungicides",
            "Thiophanate-methyl",
            "Apply during bloom through summer",
            "Copper-based fungicides as preventive",
        ],
    }),
    ("Apple", "Cedar apple rust", Treatment {
        prevention: &[
            "Remove nearby juniper/cedar trees (alternate host)",
            "Plant rust-resistant varieties (Redfree, Liberty)",
            "Improve air circulation around trees",
            "Scout for galls on junipers in early spring",
        ],
        medication: &[
            "Myclobutanil fungicide",
            "Triadimefon (Bayleton)",
            "Apply at pink bud stage",
            "Repeat every 7-10 days until petal fall",
        ],
    }),
    ("Cherry (including sour)", "Powdery mildew", Treatment {
        prevention: &[
            "Ensure good air circulation",
            "Avoid excessive nitrogen fertilization",
            "Prune to open tree canopy",
            "Plant resistant varieties when available",
        ],
        medication: &[
            "Sulfur-based fungicides",
            "Myclobutanil applications",
            "Potassium bicarbonate sprays",
            "Apply at first sign of white powdery growth",
        ],
    }),
    ("Corn (maize)", "Cercospora leaf spot Gray leaf spot", Treatment {
        prevention: &[
            "Plant resistant hybrids",
            "Rotate crops with non-host plants",
            "Manage crop residue through tillage",
            "Ensure adequate plant spacing",
        ],
        medication: &[
            "Strobilurin fungicides (Quadris, Headline)",
            "Triazole fungicides (Tilt, Propimax)",
            "Apply at tasseling if threshold reached",
            "Scout fields regularly for early detection",
        ],
    }),
    ("Corn (maize)", "Common rust", Treatment {
        prevention: &[
            "Plant resistant varieties",
            "Early planting to avoid peak infection period",
            "Monitor fields regularly",
            "Avoid late planting in endemic areas",
        ],
        medication: &[
            "Azoxystrobin fungicide",
            "Propiconazole",
            "Apply when pustules first appear on leaves",
            "Treatment usually not economical unless severe",
        ],
    }),
    ("Corn (maize)", "Northern Leaf Blight", Treatment {
        prevention: &[
            "Use resistant hybrids (Ht1, Ht2, Ht3 genes)",
            "Rotate with non-host crops",
            "Till crop residue to reduce inoculum",
            "Avoid continuous corn planting",
        ],
        medication: &[
            "Strobilurin fungicides",
            "Triazole fungicides",
            "Apply at VT-R1 growth stage",
            "Threshold: 50% of plants with lesions on third leaf",
        ],
    }),
    ("Grape", "Black rot", Treatment {
        prevention: &[
            "Remove mummified berries and infected canes",
            "Prune for good air circulation",
            "Remove wild grapes nearby",
            "Keep vineyard floor clean",
        ],
        medication: &[
            "Myclobutanil fungicide",
            "Mancozeb sprays",
            "Captan applications",
            "Apply from bud break to veraison",
        ],
    }),
    ("Grape", "Esca (Black Measles)", Treatment {
        prevention: &[
            "Avoid large pruning wounds",
            "Protect pruning cuts with wound sealant",
            "Remove and destroy infected vines",
            "Practice balanced irrigation",
        ],
        medication: &[
            "No effective chemical control available",
            "Trunk surgery for mild cases",
            "Sodium arsenite (where legally permitted)",
            "Focus on prevention and vine replacement",
        ],
    }),
    ("Grape", "Leaf blight (Isariopsis Leaf Spot)", Treatment {
        prevention: &[
            "Ensure good air circulation",
            "Avoid overhead irrigation",
            "Remove infected leaves promptly",
            "Maintain balanced nutrition",
        ],
        medication: &[
            "Mancozeb fungicide",
            "Copper-based sprays",
            "Captan applications",
            "Apply at first sign of infection",
        ],
    }),
    ("Orange", "Haunglongbing (Citrus greening)", Treatment {
        prevention: &[
            "Control Asian citrus psyllid vectors",
            "Use certified disease-free nursery stock",
            "Remove infected trees promptly",
            "Regular scouting for psyllids",
        ],
        medication: &[
            "No cure available - prevention is key",
            "Imidacloprid for psyllid control",
            "Foliar nutrition to extend tree life",
            "Remove and destroy infected trees",
        ],
    }),
    ("Peach", "Bacterial spot", Treatment {
        prevention: &[
            "Plant resistant varieties (Redhaven, Biscoe)",
            "Avoid overhead irrigation",
            "Maintain proper tree spacing",
            "Prune to improve air circulation",
        ],
        medication: &[
            "Copper hydroxide sprays (dormant season)",
            "Oxytetracycline (Mycoshield)",
            "Apply copper at leaf fall and before bud break",
            "Avoid copper after petal fall (phytotoxicity)",
        ],
    }),
    ("Pepper, bell", "Bacterial spot", Treatment {
        prevention: &[
            "Use certified disease-free seeds",
            "Hot water seed treatment (125°F for 30 min)",
            "Rotate crops every 2-3 years",
            "Avoid overhead irrigation",
        ],
        medication: &[
            "Copper hydroxide sprays",
            "Copper + Mancozeb combination",
            "Acibenzolar-S-methyl (Actigard)",
            "Apply before symptoms appear",
        ],
    }),
    ("Potato", "Early blight", Treatment {
        prevention: &[
            "Use certified disease-free seed potatoes",
            "Rotate crops every 3-4 years",
            "Avoid overhead irrigation",
            "Hill soil around plants",
        ],
        medication: &[
            "Chlorothalonil sprays",
            "Mancozeb fungicide",
            "Azoxystrobin (Quadris)",
            "Begin at first sign of disease",
        ],
    }),
    ("Potato", "Late blight", Treatment {
        prevention: &[
            "Plant resistant varieties",
            "Destroy volunteer potatoes",
            "Ensure good drainage",
            "Monitor weather conditions (cool, wet)",
        ],
        medication: &[
            "Metalaxyl-M + Mancozeb (Ridomil Gold MZ)",
            "Cymoxanil fungicides",
            "Fluazinam (Omega)",
            "Apply preventively during wet weather",
        ],
    }),
    ("Squash", "Powdery mildew", Treatment {
        prevention: &[
            "Plant resistant varieties",
            "Ensure good air circulation",
            "Avoid overcrowding plants",
            "Water at base, not on leaves",
        ],
        medication: &[
            "Sulfur-based fungicides",
            "Potassium bicarbonate (Kaligreen)",
            "Neem oil applications",
            "Myclobutanil (Immunox)",
        ],
    }),
    ("Strawberry", "Leaf scorch", Treatment {
        prevention: &[
            "Plant certified disease-free stock",
            "Ensure good air circulation",
            "Avoid overhead irrigation",
            "Remove infected leaves promptly",
        ],
        medication: &[
            "Copper-based fungicides",
            "Captan sprays",
            "Apply at first sign of symptoms",
            "Renovate beds after harvest",
        ],
    }),
    ("Tomato", "Bacterial spot", Treatment {
        prevention: &[
            "Use certified disease-free seeds",
            "Rotate crops every 2-3 years",
            "Avoid overhead watering",
            "Remove infected plant debris",
        ],
        medication: &[
            "Copper hydroxide sprays",
            "Streptomycin (for severe cases)",
            "Acibenzolar-S-methyl (Actigard)",
            "Apply copper at first sign of disease",
        ],
    }),
    ("Tomato", "Early blight", Treatment {
        prevention: &[
            "Mulch around plants to prevent soil splash",
            "Water at base of plants",
            "Remove lower leaves touching soil",
            "Practice 3-year crop rotation",
        ],
        medication: &[
            "Chlorothalonil (Daconil)",
            "Mancozeb fungicide",
            "Azoxystrobin (Quadris)",
            "Apply preventively every 7-14 days",
        ],
    }),
    ("Tomato", "Late blight", Treatment {
        prevention: &[
            "Plant resistant varieties",
            "Ensure good air circulation",
            "Avoid wetting foliage",
            "Remove volunteer potato plants nearby",
        ],
        medication: &[
            "Chlorothalonil preventive sprays",
            "Mefenoxam + Mancozeb",
            "Cymoxanil-based fungicides",
            "Apply every 5-7 days during wet weather",
        ],
    }),
    ("Tomato", "Leaf Mold", Treatment {
        prevention: &[
            "Improve greenhouse ventilation",
            "Reduce humidity below 85%",
            "Space plants adequately",
            "Use resistant varieties (many available)",
        ],
        medication: &[
            "Chlorothalonil sprays",
            "Mancozeb applications",
            "Improve air circulation first",
            "Remove severely infected leaves",
        ],
    }),
    ("Tomato", "Septoria leaf spot", Treatment {
        prevention: &[
            "Remove infected leaves promptly",
            "Mulch to prevent soil splash",
            "Avoid working with wet plants",
            "Rotate crops annually",
        ],
        medication: &[
            "Chlorothalonil fungicide",
            "Copper-based sprays",
            "Mancozeb",
            "Begin treatment at first symptom",
        ],
    }),
    ("Tomato", "Spider mites Two-spotted spider mite", Treatment {
        prevention: &[
            "Keep plants well-watered (mites prefer dry conditions)",
            "Spray plants with water to dislodge mites",
            "Introduce predatory mites (Phytoseiulus persimilis)",
            "Avoid excessive nitrogen fertilization",
        ],
        medication: &[
            "Insecticidal soap spray",
            "Neem oil applications",
            "Abamectin miticide (Avid)",
            "Sulfur dusting (avoid in hot weather >90°F)",
        ],
    }),
    ("Tomato", "Target Spot", Treatment {
        prevention: &[
            "Ensure good air circulation",
            "Avoid overhead irrigation",
            "Remove lower leaves and suckers",
            "Practice crop rotation",
        ],
        medication: &[
            "Chlorothalonil fungicide",
            "Azoxystrobin (Quadris)",
            "Mancozeb applications",
            "Apply at first sign of infection",
        ],
    }),
    ("Tomato", "Tomato Yellow Leaf Curl Virus", Treatment {
        prevention: &[
            "Control whitefly vectors aggressively",
            "Use reflective mulches",
            "Plant resistant varieties (Ty genes)",
            "Remove infected plants immediately",
        ],
        medication: &[
            "No direct cure - vector management only",
            "Imidacloprid for whitefly control",
            "Yellow sticky traps for monitoring",
            "Remove and destroy infected plants",
        ],
    }),
    ("Tomato", "Tomato mosaic virus", Treatment {
        prevention: &[
            "Use virus-free seeds and transplants",
            "Disinfect tools with 10% bleach solution",
            "Wash hands before handling plants",
            "Control aphid vectors",
        ],
        medication: &[
            "No chemical cure available",
            "Remove and destroy infected plants",
            "Plant resistant varieties (Tm-2 gene)",
            "Do not smoke near tomato plants",
        ],
    }),
];

static CARE_TABLE: &[(&str, CareTips)] = &[
    ("Apple", CareTips {
        message: "Your apple tree is thriving! Keep up the great care.",
        fun_fact: "A single apple tree can produce up to 400 apples per season!",
        care_tips: &[
            "Water deeply once a week during dry periods",
            "Prune in late winter for better fruit production",
            "Apply balanced fertilizer in early spring",
            "Mulch around the base to retain moisture",
        ],
    }),
    ("Tomato", CareTips {
        message: "Your tomato plant looks fantastic! Expect a bountiful harvest.",
        fun_fact: "Tomatoes are technically a fruit, and there are over 10,000 varieties worldwide!",
        care_tips: &[
            "Water consistently - tomatoes love 1-2 inches per week",
            "Stake or cage plants for better air circulation",
            "Remove suckers for larger fruits",
            "Add calcium to prevent blossom end rot",
        ],
    }),
    ("Potato", CareTips {
        message: "Your potato plants are in excellent condition!",
        fun_fact: "Potatoes were the first vegetable grown in space!",
        care_tips: &[
            "Hill soil around plants as they grow",
            "Water evenly to prevent scab",
            "Stop watering 2 weeks before harvest",
            "Store in cool, dark place after harvesting",
        ],
    }),
    ("Grape", CareTips {
        message: "Your grapevine is healthy and ready to flourish!",
        fun_fact: "A single grapevine can produce enough grapes for 5 bottles of wine!",
        care_tips: &[
            "Prune heavily in late winter",
            "Train vines on trellises for best production",
            "Thin grape clusters for larger berries",
            "Water deeply but infrequently",
        ],
    }),
    ("Corn (maize)", CareTips {
        message: "Your corn is growing strong and healthy!",
        fun_fact: "Corn is grown on every continent except Antarctica!",
        care_tips: &[
            "Plant in blocks for better pollination",
            "Water 1-2 inches per week",
            "Side-dress with nitrogen when knee-high",
            "Harvest when silks turn brown",
        ],
    }),
    ("Pepper, bell", CareTips {
        message: "Your pepper plants are in perfect health!",
        fun_fact: "Bell peppers have more vitamin C than oranges!",
        care_tips: &[
            "Provide consistent moisture",
            "Use stakes to support heavy fruit load",
            "Mulch to keep roots cool",
            "Harvest regularly to encourage more fruit",
        ],
    }),
    ("Cherry (including sour)", CareTips {
        message: "Your cherry tree is healthy and beautiful!",
        fun_fact: "Cherry blossoms in Japan symbolize the fragility of life!",
        care_tips: &[
            "Protect blossoms from late frost",
            "Net trees to protect from birds",
            "Prune after fruiting",
            "Water deeply during dry spells",
        ],
    }),
    ("Strawberry", CareTips {
        message: "Your strawberry plants are thriving!",
        fun_fact: "Strawberries are the only fruit with seeds on the outside!",
        care_tips: &[
            "Mulch with straw to prevent fruit rot",
            "Remove runners for larger berries",
            "Water in the morning to prevent disease",
            "Renovate beds after 3 years",
        ],
    }),
    ("Blueberry", CareTips {
        message: "Your blueberry bush is thriving beautifully!",
        fun_fact: "Blueberries are one of the few fruits native to North America!",
        care_tips: &[
            "Maintain acidic soil pH (4.5-5.5)",
            "Mulch with pine bark or sawdust",
            "Water 1-2 inches per week",
            "Prune old canes annually",
        ],
    }),
    ("Orange", CareTips {
        message: "Your citrus tree is in excellent health!",
        fun_fact: "Orange trees can live and produce fruit for over 100 years!",
        care_tips: &[
            "Water deeply but allow soil to dry between watering",
            "Fertilize with citrus-specific fertilizer",
            "Protect from frost in winter",
            "Prune to maintain shape and airflow",
        ],
    }),
    ("Peach", CareTips {
        message: "Your peach tree looks wonderful!",
        fun_fact: "Peaches are related to almonds and are sometimes called 'Persian apples'!",
        care_tips: &[
            "Prune heavily in late winter",
            "Thin fruits for larger peaches",
            "Apply dormant spray in winter",
            "Water deeply during fruit development",
        ],
    }),
    ("Raspberry", CareTips {
        message: "Your raspberry plants are flourishing!",
        fun_fact: "Raspberries are part of the rose family and each berry has 100-120 seeds!",
        care_tips: &[
            "Provide support with trellises",
            "Prune old canes after fruiting",
            "Mulch to keep roots cool",
            "Water consistently especially during fruiting",
        ],
    }),
    ("Soybean", CareTips {
        message: "Your soybean crop is growing strong!",
        fun_fact: "Soybeans fix nitrogen from the air, improving soil fertility!",
        care_tips: &[
            "Plant after soil warms to 60°F",
            "Inoculate seeds for nitrogen fixation",
            "Scout regularly for pests",
            "Harvest when leaves drop and pods rattle",
        ],
    }),
];
