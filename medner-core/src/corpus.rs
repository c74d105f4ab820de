//! # Vocabulário Semente e Notas de Demonstração
//!
//! Listas de medicamentos e doenças frequentes em notas clínicas em inglês,
//! usadas pelo [`crate::classifier::GazetteerClassifier`] quando nenhum
//! modelo treinado está disponível, e notas curtas para a interface web.
//!
//! ## Domínios Cobertos
//! - Analgésicos e anti-inflamatórios
//! - Antibióticos
//! - Cardiologia e endocrinologia
//! - Doenças crônicas e infecciosas

/// Medicamentos e substâncias (rótulo `CHEMICAL`)
pub const CHEMICALS: &[&str] = &[
    // Analgésicos / AINEs
    "aspirin", "ibuprofen", "naproxen", "acetaminophen", "paracetamol", "diclofenac",
    "celecoxib", "morphine", "tramadol", "codeine", "oxycodone",
    // Antibióticos
    "amoxicillin", "azithromycin", "ciprofloxacin", "doxycycline", "cephalexin",
    "penicillin", "vancomycin", "metronidazole", "clindamycin",
    // Cardiovascular
    "lisinopril", "enalapril", "losartan", "amlodipine", "metoprolol", "atenolol",
    "atorvastatin", "simvastatin", "warfarin", "heparin", "clopidogrel", "furosemide",
    "hydrochlorothiazide", "digoxin",
    // Endócrino
    "insulin", "metformin", "glipizide", "levothyroxine", "prednisone", "dexamethasone",
    // SNC / outros
    "sertraline", "fluoxetine", "diazepam", "lorazepam", "gabapentin", "omeprazole",
    "pantoprazole", "salbutamol", "albuterol", "montelukast", "cetirizine",
];

/// Doenças e condições (rótulo `DISEASE`)
pub const DISEASES: &[&str] = &[
    "diabetes", "type 2 diabetes", "type 1 diabetes", "diabetes mellitus",
    "hypertension", "hypotension", "heart failure", "atrial fibrillation",
    "myocardial infarction", "coronary artery disease", "stroke",
    "asthma", "copd", "pneumonia", "bronchitis", "tuberculosis",
    "bacterial infection", "urinary tract infection", "sepsis", "influenza", "covid-19",
    "hypothyroidism", "hyperthyroidism", "obesity", "hyperlipidemia",
    "depression", "anxiety", "epilepsy", "migraine", "arthritis", "rheumatoid arthritis",
    "osteoporosis", "anemia", "chronic kidney disease", "cancer", "hepatitis",
];

/// Retorna notas clínicas de demonstração: (domínio, texto)
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "prescrição",
            "The patient was prescribed Aspirin 500mg and Metformin 850 mg for type 2 diabetes.",
        ),
        (
            "antibiótico",
            "Patient prescribed 500mg Amoxicillin 3x daily for bacterial infection.",
        ),
        ("endocrinologia", "Inject 10ml of Insulin for diabetes."),
        (
            "cardiologia",
            "Diagnosis: Severe hypertension. Plan: Lisinopril 10 mg daily.",
        ),
    ]
}
