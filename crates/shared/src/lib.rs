use serde::{Deserialize, Serialize};

/// Название материала (ключ справочника материалов)
pub type MaterialName = String;

/// Название цветового варианта внутри материала
pub type VariantName = String;

/// Тип поверхности отпечатка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    #[default]
    Glossy,
    Satin,
    Matte,
}

/// Цветовой вариант материала.
///
/// До трёх цветов: `color` для низа модели, `color2` для середины, `color3` для верха.
/// Для однотонных вариантов все три совпадают.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub name: VariantName,
    pub color: String,
    pub color2: String,
    pub color3: String,
    pub opacity: f32,
    pub finish: Finish,
    /// Есть ли в наличии
    pub stock: bool,
    /// Описание для пользователя
    pub information: String,
}

impl ColorVariant {
    /// Три цвета градиента в порядке снизу вверх
    pub fn colors(&self) -> [&str; 3] {
        [&self.color, &self.color2, &self.color3]
    }
}

/// Профиль материала: справочные данные, не изменяются
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub name: MaterialName,
    /// Плотность, г/см³
    pub density: f64,
    /// Цена за кг; если не задана, используется цена по умолчанию
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<f64>,
    /// Цветовые варианты, порядок значим (первый используется по умолчанию)
    pub variants: Vec<ColorVariant>,
}

impl MaterialProfile {
    /// Найти цветовой вариант по имени
    pub fn variant(&self, name: &str) -> Option<&ColorVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Вариант по умолчанию (первый в списке)
    pub fn first_variant(&self) -> Option<&ColorVariant> {
        self.variants.first()
    }
}

fn default_minutes_per_cbrt_mm3() -> f64 {
    10.0
}

fn default_printer_power_watts() -> f64 {
    150.0
}

fn default_price_per_kwh() -> f64 {
    0.3
}

/// Эмпирическая модель скорости печати и энергопотребления
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintSpeedModel {
    /// Минут печати на кубический корень из объёма (мм³)
    #[serde(default = "default_minutes_per_cbrt_mm3")]
    pub minutes_per_cbrt_mm3: f64,
    /// Мощность принтера, Вт
    #[serde(default = "default_printer_power_watts")]
    pub printer_power_watts: f64,
    /// Цена электроэнергии за кВт·ч
    #[serde(default = "default_price_per_kwh")]
    pub price_per_kwh: f64,
    /// Фиксированная надбавка к цене
    #[serde(default)]
    pub extra_cost: f64,
}

impl Default for PrintSpeedModel {
    fn default() -> Self {
        Self {
            minutes_per_cbrt_mm3: default_minutes_per_cbrt_mm3(),
            printer_power_watts: default_printer_power_watts(),
            price_per_kwh: default_price_per_kwh(),
            extra_cost: 0.0,
        }
    }
}

/// Входные данные одного пересчёта оценки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// Объём модели до масштабирования, мм³
    pub volume_mm3: f64,
    /// Равномерный масштаб
    pub scale: f64,
    /// Заполнение, %
    pub infill_percent: f64,
    /// Плотность материала, г/см³
    pub density: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<f64>,
    #[serde(default)]
    pub speed_model: PrintSpeedModel,
}

/// Результат оценки. Хранится с полной точностью,
/// округление только при выводе (`to_response`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub filament_grams: f64,
    pub time_hours: f64,
    pub price: f64,
}

impl Estimate {
    /// Представление для клиента: строки с двумя знаками после запятой
    pub fn to_response(&self) -> EstimateResponse {
        EstimateResponse {
            filament: format!("{:.2}", self.filament_grams),
            time: format!("{:.2}", self.time_hours),
            price: format!("{:.2}", self.price),
            dimensions: None,
        }
    }
}

/// Ответ API с оценкой (`/api/slice`, `/api/estimate`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub filament: String,
    pub time: String,
    pub price: String,
    /// Габариты модели (X, Y, Z) в мм, только для объёмной оценки
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[String; 3]>,
}

/// Ответ `/api/estimate`: у модели без объёма оценки нет, габариты есть
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelEstimateResponse {
    Estimate(EstimateResponse),
    NoEstimate {
        message: String,
        dimensions: [String; 3],
    },
}

/// Ответ API с ошибкой
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

fn default_material() -> MaterialName {
    "PLA".to_string()
}

fn default_variant() -> VariantName {
    "Green".to_string()
}

fn default_infill() -> f64 {
    15.0
}

fn default_scale() -> f64 {
    1.0
}

fn default_layer_height() -> f64 {
    0.2
}

/// Параметры, выбранные пользователем
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateParameters {
    #[serde(default = "default_material")]
    pub material: MaterialName,
    #[serde(default = "default_variant")]
    pub color: VariantName,
    #[serde(default = "default_infill")]
    pub infill_percent: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Высота слоя, мм. На объёмную оценку не влияет
    #[serde(default = "default_layer_height")]
    pub layer_height: f64,
}

impl Default for EstimateParameters {
    fn default() -> Self {
        Self {
            material: default_material(),
            color: default_variant(),
            infill_percent: default_infill(),
            scale: default_scale(),
            layer_height: default_layer_height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_variant() -> ColorVariant {
        ColorVariant {
            name: "Gold".into(),
            color: "#f8cc36".into(),
            color2: "#f8cc36".into(),
            color3: "#f8cc36".into(),
            opacity: 1.0,
            finish: Finish::Glossy,
            stock: true,
            information: "Silky".into(),
        }
    }

    #[test]
    fn test_finish_serde() {
        assert_eq!(serde_json::to_string(&Finish::Satin).unwrap(), r#""satin""#);
        let f: Finish = serde_json::from_str(r#""matte""#).unwrap();
        assert_eq!(f, Finish::Matte);
    }

    #[test]
    fn test_material_profile_serde_roundtrip() {
        let profile = MaterialProfile {
            name: "PLA+ Silk".into(),
            density: 1.24,
            price_per_kg: None,
            variants: vec![sample_variant()],
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("price_per_kg"));
        let back: MaterialProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_variant_lookup() {
        let profile = MaterialProfile {
            name: "PLA+ Silk".into(),
            density: 1.24,
            price_per_kg: None,
            variants: vec![sample_variant()],
        };
        assert_eq!(profile.variant("Gold").map(|v| v.color.as_str()), Some("#f8cc36"));
        assert!(profile.variant("Silver").is_none());
        assert_eq!(profile.first_variant().unwrap().name, "Gold");
    }

    #[test]
    fn test_speed_model_defaults() {
        let m = PrintSpeedModel::default();
        assert_eq!(m.minutes_per_cbrt_mm3, 10.0);
        assert_eq!(m.printer_power_watts, 150.0);
        assert_eq!(m.price_per_kwh, 0.3);
        assert_eq!(m.extra_cost, 0.0);

        let parsed: PrintSpeedModel = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_estimate_response_two_decimals() {
        let e = Estimate {
            filament_grams: 1.2449,
            time_hours: 2.0,
            price: 0.456,
        };
        let r = e.to_response();
        assert_eq!(r.filament, "1.24");
        assert_eq!(r.time, "2.00");
        assert_eq!(r.price, "0.46");
    }

    #[test]
    fn test_estimate_response_omits_dimensions() {
        let r = Estimate {
            filament_grams: 0.0,
            time_hours: 0.0,
            price: 0.0,
        }
        .to_response();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"filament":"0.00","time":"0.00","price":"0.00"}"#);
    }

    #[test]
    fn test_model_estimate_response_shapes() {
        let ready = ModelEstimateResponse::Estimate(
            Estimate {
                filament_grams: 1.0,
                time_hours: 1.0,
                price: 1.0,
            }
            .to_response(),
        );
        let json = serde_json::to_string(&ready).unwrap();
        assert_eq!(json, r#"{"filament":"1.00","time":"1.00","price":"1.00"}"#);

        let none = ModelEstimateResponse::NoEstimate {
            message: "flat".into(),
            dimensions: ["1.00".into(), "1.00".into(), "0.00".into()],
        };
        let json = serde_json::to_string(&none).unwrap();
        assert_eq!(json, r#"{"message":"flat","dimensions":["1.00","1.00","0.00"]}"#);
        let back: ModelEstimateResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, none);
    }

    #[test]
    fn test_parameters_defaults_from_empty_json() {
        let p: EstimateParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(p, EstimateParameters::default());
        assert_eq!(p.material, "PLA");
        assert_eq!(p.infill_percent, 15.0);
    }

    #[test]
    fn test_error_response_serde() {
        let json = serde_json::to_string(&ErrorResponse::new("Slicing failed")).unwrap();
        assert_eq!(json, r#"{"error":"Slicing failed"}"#);
    }
}
